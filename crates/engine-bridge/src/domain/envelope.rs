//! Outgoing request envelope and command aliasing.
//!
//! Callers address the worker with logical command names. A few of those are
//! registered under a different name on the transport side; the table below
//! is part of the wire contract with the host and must not change.

use crate::domain::error::{BridgeError, BridgeResult};
use crate::domain::request_id::RequestId;
use serde_json::{Map, Value};

/// Key the request id is stored under in the envelope.
pub const REQUEST_ID_FIELD: &str = "request_id";

/// Caller-facing to transport-facing command names.
pub const COMMAND_ALIASES: &[(&str, &str)] = &[
    ("load_data", "load_data_source"),
    ("run_backtest", "run_backtest_simulation"),
];

/// Resolve the transport-facing name for a caller-facing command.
///
/// Names without an alias pass through unchanged.
pub fn worker_command(command: &str) -> &str {
    COMMAND_ALIASES
        .iter()
        .find(|(caller, _)| *caller == command)
        .map_or(command, |&(_, worker)| worker)
}

/// A request ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    /// Name the caller used.
    pub command: String,
    /// Name put on the transport.
    pub worker_command: String,
    /// Generated correlation id.
    pub request_id: RequestId,
    /// Caller params with `request_id` merged in.
    pub payload: Value,
}

impl RequestEnvelope {
    /// Build an envelope from caller params.
    ///
    /// `params` must be a JSON object or `null` (treated as `{}`). The
    /// generated id overwrites any `request_id` the caller supplied.
    pub fn build(command: &str, params: Value, request_id: RequestId) -> BridgeResult<Self> {
        let mut fields = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(BridgeError::InvalidParams {
                    command: command.to_string(),
                    kind: value_kind(&other),
                })
            }
        };

        fields.insert(
            REQUEST_ID_FIELD.to_string(),
            Value::String(request_id.as_str().to_string()),
        );

        Ok(Self {
            command: command.to_string(),
            worker_command: worker_command(command).to_string(),
            request_id,
            payload: Value::Object(fields),
        })
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
