//! Runner - compiles a persona into a stage graph and executes it.

use super::{StageGraph, StageNode};
use crate::errors::{ResolveError, StageError};
use crate::events::{
    EventSink, PIPELINE_COMPLETED, PIPELINE_FAILED, PIPELINE_STARTED, STAGE_COMPLETED,
    STAGE_FAILED, STAGE_STARTED,
};
use crate::persona::Persona;
use crate::registry::StageResolver;
use crate::state::{keys, State};
use crate::utils::generate_run_id;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

/// Executes one persona.
///
/// Every stage is resolved once, when the runner is built. Runs are
/// sequential: each stage is awaited before the next one starts.
pub struct Runner {
    persona: Persona,
    graph: StageGraph,
    events: Arc<dyn EventSink>,
}

impl Runner {
    /// Resolves the persona's frames, then its operators, and compiles them
    /// into a linear graph.
    ///
    /// # Errors
    ///
    /// Returns the first [`ResolveError`]; nothing is run.
    pub fn new(persona: Persona, resolver: &StageResolver) -> Result<Self, ResolveError> {
        let mut nodes = Vec::with_capacity(
            persona.frame_stage_names().len() + persona.operator_stage_names().len(),
        );

        for name in persona.frame_stage_names() {
            nodes.push(StageNode::new(resolver.resolve_frame(name)?));
        }
        for name in persona.operator_stage_names() {
            nodes.push(StageNode::new(
                resolver.resolve_operator(name, persona.extension_stage_names())?,
            ));
        }

        let graph = StageGraph::linear(persona.name(), nodes);
        info!(
            persona = %persona.name(),
            stages = ?graph.stage_names(),
            "Compiled persona pipeline"
        );

        Ok(Self {
            persona,
            graph,
            events: resolver.ports().events.clone(),
        })
    }

    /// The persona this runner executes.
    #[must_use]
    pub const fn persona(&self) -> &Persona {
        &self.persona
    }

    /// The compiled graph.
    #[must_use]
    pub const fn graph(&self) -> &StageGraph {
        &self.graph
    }

    /// Runs the pipeline over `state` and returns the finish node's state.
    ///
    /// # Errors
    ///
    /// The first stage error aborts the run and is returned unchanged.
    pub async fn run(&self, state: State) -> Result<State, StageError> {
        let run_id = generate_run_id();
        let span = info_span!("pipeline.run", persona = %self.persona.name(), %run_id);
        self.execute(state, run_id).instrument(span).await
    }

    async fn execute(&self, state: State, run_id: Uuid) -> Result<State, StageError> {
        let started = Instant::now();
        let mut state = self.prepare(state)?;

        self.events.try_emit(
            PIPELINE_STARTED,
            Some(json!({
                "persona": self.persona.name(),
                "run_id": run_id.to_string(),
                "stages": self.graph.stage_names(),
            })),
        );

        for node in self.graph.execution_order() {
            let stage_started = Instant::now();
            debug!(stage = %node.name(), kind = %node.kind(), "Running stage");
            self.events.try_emit(
                STAGE_STARTED,
                Some(json!({"stage": node.name(), "kind": node.kind()})),
            );

            state = match node.stage().run(state).await {
                Ok(next) => next,
                Err(err) => {
                    error!(stage = %node.name(), error = %err, "Stage failed");
                    self.events.try_emit(
                        STAGE_FAILED,
                        Some(json!({
                            "stage": node.name(),
                            "error": err.to_string(),
                            "duration_ms": elapsed_ms(stage_started),
                        })),
                    );
                    self.events.try_emit(
                        PIPELINE_FAILED,
                        Some(json!({
                            "persona": self.persona.name(),
                            "run_id": run_id.to_string(),
                            "stage": node.name(),
                            "error": err.to_string(),
                        })),
                    );
                    return Err(err);
                }
            };

            self.events.try_emit(
                STAGE_COMPLETED,
                Some(json!({
                    "stage": node.name(),
                    "duration_ms": elapsed_ms(stage_started),
                })),
            );
        }

        let duration_ms = elapsed_ms(started);
        info!(duration_ms, "Pipeline completed");
        self.events.try_emit(
            PIPELINE_COMPLETED,
            Some(json!({
                "persona": self.persona.name(),
                "run_id": run_id.to_string(),
                "duration_ms": duration_ms,
            })),
        );
        Ok(state)
    }

    /// Writes the persona's extension names, and its tone when the caller
    /// set none, into `metadata`.
    fn prepare(&self, mut state: State) -> Result<State, StageError> {
        let metadata = state.section_mut(keys::METADATA).ok_or_else(|| {
            StageError::invalid_state(self.persona.name(), "metadata is not an object")
        })?;

        metadata.insert(
            keys::EXTENSION_STAGE_NAMES.to_string(),
            Value::from(self.persona.extension_stage_names().to_vec()),
        );
        if !metadata.contains_key(keys::TONE) {
            metadata.insert(keys::TONE.to_string(), Value::from(self.persona.tone()));
        }
        Ok(state)
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("persona", &self.persona.name())
            .field("graph", &self.graph)
            .finish_non_exhaustive()
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
