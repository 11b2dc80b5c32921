//! # Engine Telemetry
//!
//! Structured logging for the bridge, the sidecar host and the CLI.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use engine_telemetry::{init_tracing, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_tracing(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ENGINE_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `ENGINE_JSON_LOGS` | `false` | Emit JSON lines instead of text |
//! | `ENGINE_LOG_SOURCE` | `false` | Include file and line in log records |
//! | `ENGINE_SERVICE_NAME` | `engine-bridge` | Service name attached to the startup log |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("invalid log filter `{filter}`: {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}
