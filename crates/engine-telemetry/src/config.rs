//! Telemetry configuration from environment variables.

use std::env;

/// Default service name.
pub const DEFAULT_SERVICE_NAME: &str = "engine-bridge";

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to logs
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error, or a directive list)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to include file and line in log records
    pub with_source_location: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_source_location: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ENGINE_SERVICE_NAME`: Service name (default: engine-bridge)
    /// - `ENGINE_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `ENGINE_JSON_LOGS`: Enable JSON logs (default: false)
    /// - `ENGINE_LOG_SOURCE`: Include file/line (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) but reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            service_name: lookup("ENGINE_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: lookup("ENGINE_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            json_logs: lookup("ENGINE_JSON_LOGS")
                .map(|v| is_truthy(&v))
                .unwrap_or(defaults.json_logs),

            with_source_location: lookup("ENGINE_LOG_SOURCE")
                .map(|v| is_truthy(&v))
                .unwrap_or(defaults.with_source_location),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
