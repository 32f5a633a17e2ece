//! Mock stages and capabilities for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::errors::{ExternalCapabilityError, StageError};
use crate::generation::{GenerationParams, TextGenerator};
use crate::stages::{Stage, StageKind};
use crate::state::State;

/// A stage that sets `output` to a fixed text.
#[derive(Debug, Clone)]
pub struct SetOutputStage {
    name: String,
    kind: StageKind,
    output: String,
}

impl SetOutputStage {
    /// Creates a frame that sets `output`.
    #[must_use]
    pub fn frame(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StageKind::Frame,
            output: output.into(),
        }
    }

    /// Creates an operator that sets `output`.
    #[must_use]
    pub fn operator(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StageKind::Operator,
            output: output.into(),
        }
    }
}

#[async_trait]
impl Stage for SetOutputStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self, mut state: State) -> Result<State, StageError> {
        state.set_output(self.output.clone());
        Ok(state)
    }
}

/// A stage that always fails with [`StageError::Execution`].
#[derive(Debug, Clone)]
pub struct FailingStage {
    name: String,
    kind: StageKind,
    message: String,
}

impl FailingStage {
    /// Creates a failing frame.
    #[must_use]
    pub fn frame(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StageKind::Frame,
            message: message.into(),
        }
    }

    /// Creates a failing operator.
    #[must_use]
    pub fn operator(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StageKind::Operator,
            message: message.into(),
        }
    }
}

#[async_trait]
impl Stage for FailingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self, _state: State) -> Result<State, StageError> {
        Err(StageError::execution(&self.name, &self.message))
    }
}

/// Shared, ordered log of stage names, written by [`RecordingStage`]s.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl ExecutionLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Entries in the order they were recorded.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Clears the log.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// A pass-through stage that records its name in an [`ExecutionLog`].
#[derive(Debug, Clone)]
pub struct RecordingStage {
    name: String,
    kind: StageKind,
    log: ExecutionLog,
}

impl RecordingStage {
    /// Creates a recording stage.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: StageKind, log: ExecutionLog) -> Self {
        Self {
            name: name.into(),
            kind,
            log,
        }
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self, state: State) -> Result<State, StageError> {
        self.log.record(&self.name);
        Ok(state)
    }
}

/// A text generator that replays canned responses.
///
/// Responses are returned in order; once they run out the last one repeats.
/// Prompts are recorded for inspection.
#[derive(Debug, Default)]
pub struct MockTextGenerator {
    responses: Mutex<VecDeque<String>>,
    last: Mutex<Option<String>>,
    failure: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockTextGenerator {
    /// Creates a generator returning `responses` in order.
    #[must_use]
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    /// Creates a generator whose every call fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Prompts received so far.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Number of calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, ExternalCapabilityError> {
        self.prompts.lock().push(prompt.to_string());

        if let Some(message) = &self.failure {
            return Err(ExternalCapabilityError::Generation(message.clone()));
        }

        let mut last = self.last.lock();
        if let Some(next) = self.responses.lock().pop_front() {
            *last = Some(next);
        }
        Ok(last.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_mock_generator_repeats_last_response() {
        let generator = MockTextGenerator::new(vec!["one".into(), "two".into()]);
        let params = GenerationParams::new();

        let mut outputs = Vec::new();
        for prompt in ["a", "b", "c"] {
            outputs.push(generator.generate(prompt, &params).await.unwrap());
        }

        assert_eq!(outputs, vec!["one", "two", "two"]);
        assert_eq!(generator.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_recording_stage_logs_in_order() {
        let log = ExecutionLog::new();
        let first = RecordingStage::new("first", StageKind::Frame, log.clone());
        let second = RecordingStage::new("second", StageKind::Operator, log.clone());

        let state = first.run(State::new()).await.unwrap();
        second.run(state).await.unwrap();

        assert_eq!(log.entries(), vec!["first", "second"]);
    }
}
