//! Domain types for the command bridge.
//!
//! Wire types, request identity, configuration, errors and the pending
//! request table.

pub mod config;
pub mod envelope;
pub mod error;
pub mod pending;
pub mod request_id;
pub mod response;

// Re-exports for convenience
pub use config::{BridgeConfig, ConfigError, DEFAULT_TIMEOUT};
pub use envelope::{worker_command, RequestEnvelope, COMMAND_ALIASES, REQUEST_ID_FIELD};
pub use error::{BridgeError, BridgeResult};
pub use pending::{PendingRequestTable, PendingStats, Settlement};
pub use request_id::RequestId;
pub use response::{ResponseBody, ResponseStatus, WorkerResponse};
