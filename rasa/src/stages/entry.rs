//! Entry frame and memory-scope frames.

use super::{Stage, StageKind};
use crate::errors::StageError;
use crate::generation::{GenerationParams, TextGenerator};
use crate::state::{keys, State};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Output set when the user input is blank.
pub const UNCLEAR_REQUEST_MESSAGE: &str = "I'm not sure what you're asking for.";

/// Intent recorded when the caller supplies none in `metadata.intent`.
const DEFAULT_INTENT: &str = "general_request";

/// The entry frame: validates raw input and tags the request intent.
///
/// Stateless: it reads nothing but the incoming state.
pub struct StatelessFrame {
    name: String,
    generator: Option<Arc<dyn TextGenerator>>,
    params: GenerationParams,
}

impl StatelessFrame {
    /// Creates an entry frame without a text generator.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generator: None,
            params: GenerationParams::default(),
        }
    }

    /// Answers non-blank input directly through `generator`.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Sets the generation parameters.
    #[must_use]
    pub const fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }
}

impl std::fmt::Debug for StatelessFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatelessFrame")
            .field("name", &self.name)
            .field("has_generator", &self.generator.is_some())
            .finish()
    }
}

#[async_trait]
impl Stage for StatelessFrame {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Frame
    }

    async fn run(&self, mut state: State) -> Result<State, StageError> {
        info!(stage = %self.name, "Received user input");

        let input = state.user_input().unwrap_or_default().trim().to_string();
        if input.is_empty() {
            info!(stage = %self.name, "No input provided");
            state.set_output(UNCLEAR_REQUEST_MESSAGE);
            return Ok(state);
        }

        let intent = state
            .metadata_str(keys::INTENT)
            .unwrap_or(DEFAULT_INTENT)
            .to_string();
        state
            .section_mut(keys::CONTEXT)
            .ok_or_else(|| StageError::invalid_state(&self.name, "context is not an object"))?
            .insert(keys::INTENT.to_string(), Value::String(intent));

        if let Some(generator) = &self.generator {
            let response = generator.generate(&input, &self.params).await?;
            state.set_output(response);
        }

        Ok(state)
    }
}

/// A memory-scope frame (session, short-term, long-term, persona).
///
/// No backing store is wired in, so it logs and passes the state through.
#[derive(Debug, Clone)]
pub struct MemoryFrame {
    name: String,
    scope: &'static str,
}

impl MemoryFrame {
    /// Creates a memory frame for `scope`.
    #[must_use]
    pub fn new(name: impl Into<String>, scope: &'static str) -> Self {
        Self {
            name: name.into(),
            scope,
        }
    }

    /// The memory scope this frame stands for.
    #[must_use]
    pub const fn scope(&self) -> &'static str {
        self.scope
    }
}

#[async_trait]
impl Stage for MemoryFrame {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Frame
    }

    async fn run(&self, state: State) -> Result<State, StageError> {
        info!(stage = %self.name, scope = self.scope, "Simulating memory enrichment (no-op)");
        Ok(state)
    }
}
