//! Command invoker.
//!
//! The single async call contract of the bridge: send a named command with
//! params to the worker and await its correlated response, bounded by a
//! timeout.

use crate::domain::config::{BridgeConfig, ConfigError};
use crate::domain::envelope::RequestEnvelope;
use crate::domain::error::{BridgeError, BridgeResult};
use crate::domain::pending::{PendingRequestTable, PendingStats};
use crate::domain::request_id::RequestId;
use crate::domain::response::WorkerResponse;
use crate::ipc::listener::{ListenerStats, ResponseListener};
use crate::ipc::transport::WorkerTransport;
use engine_bus::OutputEventBus;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Bridge between callers and a worker that answers on its output stream.
pub struct CommandBridge {
    config: BridgeConfig,
    pending: PendingRequestTable,
    listener: ResponseListener,
    transport: Arc<dyn WorkerTransport>,
}

impl CommandBridge {
    pub fn new(
        config: BridgeConfig,
        bus: Arc<OutputEventBus>,
        transport: Arc<dyn WorkerTransport>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let pending = PendingRequestTable::new();
        let listener = ResponseListener::new(pending.clone(), bus, config.output_event.clone());

        Ok(Self {
            config,
            pending,
            listener,
            transport,
        })
    }

    /// Send a command with the configured default timeout.
    pub async fn invoke(&self, command: &str, params: Value) -> BridgeResult<WorkerResponse> {
        self.invoke_with_timeout(command, params, self.config.default_timeout)
            .await
    }

    /// Send a command and wait at most `timeout` for its response.
    ///
    /// Worker-reported `error` and `warn` responses are returned as `Ok`; only
    /// a failed hand-off or a missing response is an `Err`.
    pub async fn invoke_with_timeout(
        &self,
        command: &str,
        params: Value,
        timeout: Duration,
    ) -> BridgeResult<WorkerResponse> {
        self.listener.ensure_installed();

        let envelope = RequestEnvelope::build(command, params, RequestId::generate())?;
        let RequestEnvelope {
            command,
            worker_command,
            request_id,
            payload,
        } = envelope;

        let rx = self.pending.register(request_id.clone(), &command, timeout)?;

        if let Err(source) = self.transport.dispatch(&worker_command, payload).await {
            warn!(
                request_id = %request_id,
                command = %command,
                error = %source,
                "Dispatch to worker failed"
            );
            self.pending.cancel(
                &request_id,
                BridgeError::DispatchFailure {
                    command: command.clone(),
                    source,
                },
            );
        } else {
            debug!(
                request_id = %request_id,
                command = %command,
                worker_command = %worker_command,
                "Dispatched request"
            );
        }

        match rx.await {
            Ok(settlement) => settlement,
            // Sender dropped without settling
            Err(_) => Err(BridgeError::Closed { command }),
        }
    }

    /// Install the output listener ahead of the first call.
    pub fn ensure_listening(&self) -> bool {
        self.listener.ensure_installed()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.pending_count()
    }

    pub fn pending_stats(&self) -> &PendingStats {
        self.pending.stats()
    }

    pub fn listener_stats(&self) -> &ListenerStats {
        self.listener.stats()
    }
}
