//! Worker invocation transport.
//!
//! The transport hands a request to the worker and settles as soon as the
//! hand-off is confirmed. Results never come back through it; they arrive
//! later on the output bus.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Sends requests to the worker.
#[async_trait]
pub trait WorkerTransport: Send + Sync {
    /// Hand `payload` to the worker under the transport-level `command` name.
    async fn dispatch(&self, command: &str, payload: Value) -> Result<(), TransportError>;
}

/// Transport error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("worker is not running")]
    WorkerUnavailable,
    #[error("unknown worker command: {0}")]
    UnknownCommand(String),
    #[error("failed to encode request: {0}")]
    Serialize(String),
    #[error("I/O error writing to worker: {0}")]
    Io(#[source] Arc<std::io::Error>),
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("channel closed")]
    ChannelClosed,
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

/// In-memory transport that forwards every dispatch to a channel.
///
/// Lets a test (or an embedded worker) play the worker side: read the
/// dispatched requests and emit responses on the output bus in any order.
pub mod channel {
    use super::*;

    /// A request as it was handed to the transport.
    #[derive(Debug, Clone, PartialEq)]
    pub struct DispatchedRequest {
        pub command: String,
        pub payload: Value,
    }

    impl DispatchedRequest {
        /// The `request_id` field of the payload, if present.
        pub fn request_id(&self) -> Option<&str> {
            self.payload.get("request_id").and_then(Value::as_str)
        }
    }

    pub struct ChannelTransport(pub mpsc::UnboundedSender<DispatchedRequest>);

    #[async_trait]
    impl WorkerTransport for ChannelTransport {
        async fn dispatch(&self, command: &str, payload: Value) -> Result<(), TransportError> {
            self.0
                .send(DispatchedRequest {
                    command: command.to_string(),
                    payload,
                })
                .map_err(|_| TransportError::ChannelClosed)
        }
    }

    /// Create a transport and the receiving end the worker side reads.
    pub fn create_channel() -> (ChannelTransport, mpsc::UnboundedReceiver<DispatchedRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelTransport(tx), rx)
    }
}

#[cfg(test)]
mod tests {
    use super::channel::*;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_channel_transport_forwards() {
        let (transport, mut rx) = create_channel();

        transport
            .dispatch("load_data_source", json!({"file_path": "2024", "request_id": "r1"}))
            .await
            .unwrap();

        let request = rx.recv().await.unwrap();
        assert_eq!(request.command, "load_data_source");
        assert_eq!(request.request_id(), Some("r1"));
    }

    #[tokio::test]
    async fn test_channel_transport_closed() {
        let (transport, rx) = create_channel();
        drop(rx);

        let err = transport.dispatch("get_data_stats", json!({})).await.unwrap_err();
        assert!(matches!(err, TransportError::ChannelClosed));
    }

    #[test]
    fn test_io_error_conversion() {
        let err: TransportError =
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed").into();
        assert!(err.to_string().contains("pipe closed"));
    }
}
