//! Event sink trait and implementations.

use super::PipelineEvent;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, trace, warn, Level};

/// Destination for pipeline lifecycle events.
///
/// The runner uses `try_emit` on its hot path; the heuristic dispatcher
/// awaits `emit`. Neither may fail or panic.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Records `event_type` with an optional JSON payload.
    async fn emit(&self, event_type: &str, data: Option<Value>);

    /// Records an event from synchronous code.
    fn try_emit(&self, event_type: &str, data: Option<Value>);
}

/// Drops every event. Used when no sink is injected.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<Value>) {}

    fn try_emit(&self, _event_type: &str, _data: Option<Value>) {}
}

/// Writes events to `tracing` at a fixed level.
///
/// The stage (or extension) name is lifted out of the payload into its own
/// field so log filters can match on it.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Logs at `level`.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// Logs at debug level, which is what the CLI uses.
    #[must_use]
    pub const fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_event(&self, event_type: &str, data: Option<&Value>) {
        let stage = data
            .and_then(|data| data.get("name").or_else(|| data.get("stage")))
            .and_then(Value::as_str)
            .unwrap_or_default();

        match self.level {
            Level::TRACE => trace!(event_type, stage, payload = ?data, "pipeline event"),
            Level::DEBUG => debug!(event_type, stage, payload = ?data, "pipeline event"),
            Level::WARN => warn!(event_type, stage, payload = ?data, "pipeline event"),
            Level::ERROR => error!(event_type, stage, payload = ?data, "pipeline event"),
            _ => info!(event_type, stage, payload = ?data, "pipeline event"),
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.log_event(event_type, data.as_ref());
    }

    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        self.log_event(event_type, data.as_ref());
    }
}

/// A sink that keeps every event in memory, for tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<PipelineEvent>>,
}

impl CollectingEventSink {
    /// An empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.read().clone()
    }

    /// Returns the collected event types, in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .read()
            .iter()
            .map(|event| event.event_type.clone())
            .collect()
    }

    /// Returns events whose type starts with `type_prefix`.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<PipelineEvent> {
        self.events
            .read()
            .iter()
            .filter(|event| event.event_type.starts_with(type_prefix))
            .cloned()
            .collect()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// True until the first event arrives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Forgets recorded events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    fn record(&self, event_type: &str, data: Option<Value>) {
        self.events.write().push(PipelineEvent::new(event_type, data));
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.record(event_type, data);
    }

    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        self.record(event_type, data);
    }
}
