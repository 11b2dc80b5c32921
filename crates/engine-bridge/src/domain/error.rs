//! Bridge error types.
//!
//! Only two failures ever reach a caller in normal operation: the transport
//! refused the request, or no correlated response arrived in time. Malformed
//! or unmatched worker output is contained by the listener and never shows
//! up here.

use crate::domain::request_id::RequestId;
use crate::ipc::transport::TransportError;
use std::time::Duration;

/// Result alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors surfaced to callers of the command bridge.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    /// The transport rejected the request before any response was possible.
    #[error("command `{command}` could not be dispatched: {source}")]
    DispatchFailure {
        command: String,
        #[source]
        source: TransportError,
    },

    /// No correlated response arrived within the window.
    #[error("command `{command}` timed out after {}ms", .timeout.as_millis())]
    Timeout { command: String, timeout: Duration },

    /// Params could not be merged into an envelope.
    #[error("command `{command}` params must be a JSON object, got {kind}")]
    InvalidParams { command: String, kind: &'static str },

    /// An entry for this id is already live.
    #[error("request id {0} is already pending")]
    DuplicateRequest(RequestId),

    /// The settlement channel closed without a result.
    #[error("command `{command}` was abandoned before settlement")]
    Closed { command: String },
}

impl BridgeError {
    /// Command name the failed call was made with, if any.
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::DispatchFailure { command, .. }
            | Self::Timeout { command, .. }
            | Self::InvalidParams { command, .. }
            | Self::Closed { command } => Some(command),
            Self::DuplicateRequest(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_dispatch_failure(&self) -> bool {
        matches!(self, Self::DispatchFailure { .. })
    }
}
