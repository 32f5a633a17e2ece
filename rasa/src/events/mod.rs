//! Structured pipeline events.
//!
//! The runner and the heuristic dispatcher report lifecycle events through
//! an injected [`EventSink`]. Event types are dotted strings; see the
//! constants below.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use serde::{Deserialize, Serialize};

/// A run started.
pub const PIPELINE_STARTED: &str = "pipeline.started";
/// A run finished successfully.
pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
/// A run aborted on a stage error.
pub const PIPELINE_FAILED: &str = "pipeline.failed";
/// A stage is about to run.
pub const STAGE_STARTED: &str = "stage.started";
/// A stage returned a state.
pub const STAGE_COMPLETED: &str = "stage.completed";
/// A stage returned an error.
pub const STAGE_FAILED: &str = "stage.failed";
/// The dispatcher ran an extension stage.
pub const EXTENSION_COMPLETED: &str = "extension.completed";
/// The dispatcher skipped an extension stage.
pub const EXTENSION_SKIPPED: &str = "extension.skipped";

/// An event as recorded by a collecting sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineEvent {
    /// The event type (e.g., "stage.started").
    #[serde(rename = "type")]
    pub event_type: String,
    /// When the event was recorded (ISO 8601).
    pub timestamp: String,
    /// The event payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl PipelineEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(event_type: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: crate::utils::iso_timestamp(),
            data,
        }
    }

    /// Looks up a field of an object payload.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.as_ref().and_then(|data| data.get(key))
    }
}
