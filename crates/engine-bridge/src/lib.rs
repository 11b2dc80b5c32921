//! # Engine Bridge - Command Bridge to the Computation Worker
//!
//! Turns a fire-and-forget worker with a line-oriented output stream into
//! typed, awaitable, timed-out request/response pairs.
//!
//! ## Architecture
//!
//! ```text
//!  caller ──invoke()──▶ ┌────────────────┐  register   ┌─────────────────┐
//!                       │ CommandBridge  │ ──────────▶ │ Pending Request │
//!                       └───────┬────────┘             │      Table      │
//!                               │ dispatch()           └────────▲────────┘
//!                               ▼                               │ resolve()
//!                       ┌────────────────┐             ┌────────┴────────┐
//!                       │ WorkerTransport│             │ ResponseListener│
//!                       └───────┬────────┘             └────────▲────────┘
//!                               │                               │ parse_output()
//!                               ▼                               │
//!                         [ worker ] ── stdout lines ──▶ OutputEventBus
//! ```
//!
//! Every request carries a generated `request_id`; the worker echoes it in
//! its response and that echo is the only thing used for matching. Each
//! pending entry is settled exactly once: by its response, by its timer, or
//! by a failed dispatch.
//!
//! ## Usage
//!
//! ```ignore
//! use engine_bridge::{BridgeConfig, CommandBridge};
//!
//! let bridge = CommandBridge::new(BridgeConfig::default(), bus, transport)?;
//! let response = bridge.invoke("get_data_stats", serde_json::Value::Null).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod ipc;

pub use domain::{
    worker_command, BridgeConfig, BridgeError, BridgeResult, ConfigError, PendingRequestTable,
    PendingStats, RequestEnvelope, RequestId, ResponseBody, ResponseStatus, WorkerResponse,
    DEFAULT_TIMEOUT,
};
pub use ipc::{
    parse_output, CommandBridge, ListenerStats, ParsedOutput, ResponseListener, TransportError,
    WorkerTransport,
};
