//! Sidecar configuration.

use crate::error::HostError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How to start the worker and where its output goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SidecarConfig {
    /// Worker executable.
    pub program: PathBuf,
    /// Arguments passed to the worker.
    pub args: Vec<String>,
    /// Data directory used to resolve `load_data_source` paths. Located from
    /// the host executable when unset.
    pub data_dir: Option<PathBuf>,
    /// Event name stdout lines are emitted under.
    pub output_event: String,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("mark-six-engine"),
            args: Vec::new(),
            data_dir: None,
            output_event: engine_bus::WORKER_OUTPUT_EVENT.to_string(),
        }
    }
}

impl SidecarConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_output_event(mut self, name: impl Into<String>) -> Self {
        self.output_event = name.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), HostError> {
        if self.program.as_os_str().is_empty() {
            return Err(HostError::Config("program cannot be empty".into()));
        }
        if self.output_event.trim().is_empty() {
            return Err(HostError::Config("output_event cannot be empty".into()));
        }
        Ok(())
    }
}
