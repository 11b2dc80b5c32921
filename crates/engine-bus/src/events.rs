//! # Output Events
//!
//! A single named event carrying an arbitrary block of text.

use serde::{Deserialize, Serialize};

/// An event emitted on the output bus.
///
/// The payload is whatever the emitter read in one go: it may hold zero,
/// one or several newline-delimited protocol messages mixed with noise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEvent {
    /// Event name subscribers filter on.
    pub name: String,
    /// Raw text payload.
    pub payload: String,
}

impl OutputEvent {
    /// Create a new event.
    pub fn new(name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }

    /// Whether this event carries the given name.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
