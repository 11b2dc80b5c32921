//! Host error types.

use std::path::PathBuf;
use std::sync::Arc;

/// Errors raised while starting or configuring the worker process.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HostError {
    #[error("failed to spawn worker `{}`: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("worker {0} was not captured")]
    StdioNotCaptured(&'static str),

    #[error("invalid sidecar configuration: {0}")]
    Config(String),

    #[error("failed to stop worker: {0}")]
    Shutdown(#[source] Arc<std::io::Error>),
}
