//! Host command table.
//!
//! Maps transport-level command names to the frames the worker reads from
//! stdin. Each frame is a single JSON object terminated by a newline.

use crate::data::resolve_data_file;
use engine_bridge::TransportError;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;

/// Transport command names the host accepts.
pub const HOST_COMMANDS: &[&str] = &[
    "run_backtest_simulation",
    "load_data_source",
    "get_replay_state",
    "get_data_stats",
];

/// One request as the worker reads it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerFrame {
    pub cmd: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    pub request_id: Value,
}

impl WorkerFrame {
    /// Encode as a newline-terminated line.
    pub fn to_line(&self) -> Result<String, TransportError> {
        let mut line =
            serde_json::to_string(self).map_err(|e| TransportError::Serialize(e.to_string()))?;
        line.push('\n');
        Ok(line)
    }
}

/// Build the worker frame for a dispatched command.
pub async fn build_frame(
    command: &str,
    payload: Value,
    data_dir: &Path,
) -> Result<WorkerFrame, TransportError> {
    let request_id = payload.get("request_id").cloned().unwrap_or(Value::Null);

    let (cmd, params) = match command {
        "run_backtest_simulation" => ("run_backtest", Some(payload)),
        "load_data_source" => {
            let file_path = str_field(&payload, "file_path");
            let resolved = resolve_data_file(data_dir, file_path).await;
            ("load_data", Some(json!({ "file_path": resolved })))
        }
        "get_replay_state" => {
            let params = json!({
                "period": str_field(&payload, "period"),
                "strategy_config": payload.get("strategy_config").cloned().unwrap_or(Value::Null),
            });
            ("get_replay_state", Some(params))
        }
        "get_data_stats" => ("get_data_stats", None),
        other => return Err(TransportError::UnknownCommand(other.to_string())),
    };

    Ok(WorkerFrame {
        cmd,
        params,
        request_id,
    })
}

fn str_field<'a>(payload: &'a Value, key: &str) -> &'a str {
    payload.get(key).and_then(Value::as_str).unwrap_or("")
}
