//! Worker-facing side of the bridge.
//!
//! Requests leave through a [`WorkerTransport`]; responses come back as
//! lines on the output bus and are matched by the [`ResponseListener`].

pub mod invoker;
pub mod line_parser;
pub mod listener;
pub mod transport;

pub use invoker::CommandBridge;
pub use line_parser::{parse_output, IgnoreReason, IgnoredLine, ParsedOutput};
pub use listener::{ListenerStats, ResponseListener};
pub use transport::{channel, TransportError, WorkerTransport};
