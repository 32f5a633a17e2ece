//! StagePorts - capabilities injected into stages at construction.

use crate::events::{EventSink, NoOpEventSink};
use crate::generation::TextGenerator;
use std::sync::Arc;

/// Shared capabilities handed to every stage factory.
///
/// Ports are read-only and `Send + Sync`, so one set can serve concurrent
/// runs.
#[derive(Clone)]
pub struct StagePorts {
    /// Text generation backend for stages that call an LLM.
    pub text_generator: Option<Arc<dyn TextGenerator>>,
    /// Sink for structured pipeline events.
    pub events: Arc<dyn EventSink>,
}

impl Default for StagePorts {
    fn default() -> Self {
        Self {
            text_generator: None,
            events: Arc::new(NoOpEventSink),
        }
    }
}

impl std::fmt::Debug for StagePorts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagePorts")
            .field("has_text_generator", &self.text_generator.is_some())
            .finish_non_exhaustive()
    }
}

impl StagePorts {
    /// Creates ports with no generator and a no-op event sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text generator.
    #[must_use]
    pub fn with_text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.text_generator = Some(generator);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns true if a text generator is configured.
    #[must_use]
    pub fn has_text_generator(&self) -> bool {
        self.text_generator.is_some()
    }
}
