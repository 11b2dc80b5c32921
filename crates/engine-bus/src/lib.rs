//! # Engine Bus - Output Event Bus
//!
//! Carries the worker process output to in-process listeners.
//!
//! The host side owns the worker's stdout and re-emits every chunk it reads
//! as a named, string-payload [`OutputEvent`]. Any number of listeners can
//! subscribe to an event name; each subscription sees every event emitted
//! under that name after it was created.
//!
//! ```text
//! ┌──────────────┐   emit("python-response", line)   ┌──────────────┐
//! │ Sidecar Host │ ────────────────────────────────▶ │  Output Bus  │
//! └──────────────┘                                    └──────┬───────┘
//!                                                            │ subscribe()
//!                                                            ▼
//!                                                    ┌──────────────┐
//!                                                    │   Listener   │
//!                                                    └──────────────┘
//! ```

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::OutputEvent;
pub use publisher::{OutputEventBus, OutputPublisher};
pub use subscriber::Subscription;

/// Event name the host uses for worker stdout.
pub const WORKER_OUTPUT_EVENT: &str = "python-response";
