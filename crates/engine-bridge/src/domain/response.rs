//! Worker response wire types.
//!
//! The worker writes one JSON object per line:
//!
//! ```text
//! {"status": "ok" | "error" | "warn", "data"?: any, "message"?: string, "request_id"?: string}
//! ```
//!
//! The response is modelled as a union tagged on `status`. Anything that
//! does not carry a recognised status fails deserialisation and is
//! quarantined by the line parser instead of being trusted.

use crate::domain::request_id::RequestId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Status reported by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
    Warn,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Warn => "warn",
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields shared by every response status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseBody {
    /// Arbitrary structured result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Echo of the request id; absent on uncorrelated output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
}

/// A response emitted by the worker.
///
/// `Error` and `Warn` are worker-level outcomes delivered to the caller as
/// successful resolutions; the bridge never turns them into bridge errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WorkerResponse {
    Ok(ResponseBody),
    Error(ResponseBody),
    Warn(ResponseBody),
}

impl WorkerResponse {
    /// Build a response from its status and body.
    pub fn new(status: ResponseStatus, body: ResponseBody) -> Self {
        match status {
            ResponseStatus::Ok => Self::Ok(body),
            ResponseStatus::Error => Self::Error(body),
            ResponseStatus::Warn => Self::Warn(body),
        }
    }

    /// Successful response carrying `data` for `request_id`.
    pub fn ok(request_id: impl Into<RequestId>, data: Value) -> Self {
        Self::Ok(ResponseBody {
            data: Some(data),
            message: None,
            request_id: Some(request_id.into()),
        })
    }

    /// Worker-level error for `request_id`.
    pub fn error(request_id: impl Into<RequestId>, message: impl Into<String>) -> Self {
        Self::Error(ResponseBody {
            data: None,
            message: Some(message.into()),
            request_id: Some(request_id.into()),
        })
    }

    pub fn status(&self) -> ResponseStatus {
        match self {
            Self::Ok(_) => ResponseStatus::Ok,
            Self::Error(_) => ResponseStatus::Error,
            Self::Warn(_) => ResponseStatus::Warn,
        }
    }

    pub fn body(&self) -> &ResponseBody {
        match self {
            Self::Ok(body) | Self::Error(body) | Self::Warn(body) => body,
        }
    }

    pub fn into_body(self) -> ResponseBody {
        match self {
            Self::Ok(body) | Self::Error(body) | Self::Warn(body) => body,
        }
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.body().request_id.as_ref()
    }

    pub fn data(&self) -> Option<&Value> {
        self.body().data.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.body().message.as_deref()
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Validate an already-parsed JSON value against the response schema.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
