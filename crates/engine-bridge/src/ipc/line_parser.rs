//! Line parser for worker output.
//!
//! The worker shares its stdout between protocol messages and whatever else
//! it happens to print, and a single read can carry several messages. Every
//! line is judged on its own: blank lines and lines that do not open a JSON
//! object are skipped, lines that do but fail to parse are recorded as
//! ignored, and neither stops the rest of the block from being processed.

use crate::domain::response::WorkerResponse;
use serde_json::Value;
use std::fmt;
use tracing::{trace, warn};

/// Why a candidate line was not turned into a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The line is not valid JSON.
    InvalidJson(String),
    /// The line is JSON but not a valid worker response.
    SchemaMismatch(String),
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson(e) => write!(f, "invalid JSON: {e}"),
            Self::SchemaMismatch(e) => write!(f, "not a worker response: {e}"),
        }
    }
}

/// A line that looked like a message but was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredLine {
    pub line: String,
    pub reason: IgnoreReason,
}

/// Result of parsing one block of output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOutput {
    /// Responses in order of appearance.
    pub responses: Vec<WorkerResponse>,
    /// Candidate lines that failed to parse.
    pub ignored: Vec<IgnoredLine>,
    /// Non-empty lines that were not candidates at all.
    pub skipped: usize,
}

/// Parse a block of worker output.
pub fn parse_output(text: &str) -> ParsedOutput {
    let mut out = ParsedOutput::default();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !trimmed.starts_with('{') {
            trace!(line = trimmed, "Skipping non-protocol output");
            out.skipped += 1;
            continue;
        }

        match parse_line(trimmed) {
            Ok(response) => out.responses.push(response),
            Err(reason) => {
                warn!(line = trimmed, reason = %reason, "Ignoring malformed worker output");
                out.ignored.push(IgnoredLine {
                    line: trimmed.to_string(),
                    reason,
                });
            }
        }
    }

    out
}

fn parse_line(line: &str) -> Result<WorkerResponse, IgnoreReason> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| IgnoreReason::InvalidJson(e.to_string()))?;
    WorkerResponse::from_value(value).map_err(|e| IgnoreReason::SchemaMismatch(e.to_string()))
}
