//! # Engine Host - Sidecar Process Host
//!
//! Owns the worker process. Requests from the bridge are framed as one JSON
//! object per line on the worker's stdin; every line the worker prints on
//! stdout is re-emitted on the [`engine_bus::OutputEventBus`], and stderr is
//! logged.
//!
//! ```text
//! CommandBridge ──dispatch()──▶ Sidecar ──{"cmd",...}\n──▶ worker stdin
//!                                                        worker stdout
//! ResponseListener ◀── OutputEventBus ◀── stdout pump ◀──────┘
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod commands;
pub mod config;
pub mod data;
pub mod error;
pub mod sidecar;

pub use commands::{build_frame, WorkerFrame, HOST_COMMANDS};
pub use config::SidecarConfig;
pub use data::{locate_data_dir, resolve_data_file};
pub use error::HostError;
pub use sidecar::Sidecar;
