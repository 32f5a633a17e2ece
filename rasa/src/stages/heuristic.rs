//! The heuristic dispatcher.
//!
//! `heuristic_agent` is the one built-in stage that re-enters the resolver at
//! run time. It walks `metadata.extension_stage_names` in order and runs
//! each extension stage it can resolve. Extension failures never abort the
//! run: the dispatcher records an [`ExtensionStageFailure`], keeps the state
//! from before that extension and moves on.

use super::{Stage, StageKind};
use crate::errors::{ExtensionStageFailure, StageError};
use crate::events::{EventSink, EXTENSION_COMPLETED, EXTENSION_SKIPPED};
use crate::registry::StageResolver;
use crate::state::State;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Delegates to persona extension stages declared in configuration.
pub struct HeuristicAgent {
    name: String,
    resolver: StageResolver,
    events: Arc<dyn EventSink>,
}

impl HeuristicAgent {
    /// Creates a dispatcher that resolves extensions through `resolver` and
    /// reports to the resolver's event sink.
    #[must_use]
    pub fn new(name: impl Into<String>, resolver: StageResolver) -> Self {
        let events = resolver.ports().events.clone();
        Self {
            name: name.into(),
            resolver,
            events,
        }
    }

    async fn skip(&self, failure: ExtensionStageFailure) {
        warn!(
            stage = %self.name,
            extension = %failure.name,
            during_resolution = failure.during_resolution,
            reason = %failure.reason,
            "Skipping extension stage"
        );
        self.events
            .emit(
                EXTENSION_SKIPPED,
                Some(json!({
                    "stage": self.name,
                    "name": failure.name,
                    "reason": failure.reason,
                    "during_resolution": failure.during_resolution,
                })),
            )
            .await;
    }
}

impl std::fmt::Debug for HeuristicAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeuristicAgent")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for HeuristicAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Operator
    }

    async fn run(&self, mut state: State) -> Result<State, StageError> {
        let names = state.extension_stage_names();
        if names.is_empty() {
            debug!(stage = %self.name, "No extension stages declared");
            return Ok(state);
        }

        for name in names {
            let extension = match self.resolver.resolve_extension(&name) {
                Ok(extension) => extension,
                Err(err) => {
                    self.skip(ExtensionStageFailure::unresolved(&name, &err)).await;
                    continue;
                }
            };

            info!(stage = %self.name, extension = %name, "Delegating to extension stage");
            let fallback = state.clone();
            let started = Instant::now();

            match extension.run(state).await {
                Ok(next) => {
                    let changed = fallback.changed_keys(&next);
                    self.events
                        .emit(
                            EXTENSION_COMPLETED,
                            Some(json!({
                                "stage": self.name,
                                "name": name,
                                "duration_ms": started.elapsed().as_secs_f64() * 1000.0,
                                "changed_keys": changed,
                            })),
                        )
                        .await;
                    state = next;
                }
                Err(err) => {
                    self.skip(ExtensionStageFailure::failed(&name, &err)).await;
                    state = fallback;
                }
            }
        }

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;
    use crate::registry::{ExtensionPackage, ExtensionRegistry, StageRegistry};
    use crate::stages::{FnStage, StagePorts};
    use crate::testing::{FailingStage, SetOutputStage};
    use pretty_assertions::assert_eq;
    use serde_json::Map;

    fn dispatcher(package: ExtensionPackage, sink: Arc<CollectingEventSink>) -> HeuristicAgent {
        let resolver = StageResolver::new(
            Arc::new(StageRegistry::builtins()),
            Arc::new(ExtensionRegistry::new().with_package(package)),
            StagePorts::new().with_events(sink),
        );
        HeuristicAgent::new("heuristic_agent", resolver)
    }

    fn state_with_extensions(names: &[&str]) -> State {
        let mut metadata = Map::new();
        metadata.insert("extension_stage_names".into(), json!(names));
        State::for_request("plan a trip", Map::new(), metadata)
    }

    #[tokio::test]
    async fn test_unresolvable_extension_is_skipped() {
        let sink = Arc::new(CollectingEventSink::new());
        let package = ExtensionPackage::new("demo")
            .with_stage("b", |init| Arc::new(SetOutputStage::operator(init.name, "from b")));
        let agent = dispatcher(package, sink.clone());

        let after = agent.run(state_with_extensions(&["a", "b"])).await.unwrap();

        assert_eq!(after.output(), Some("from b"));
        assert_eq!(sink.event_types(), vec![EXTENSION_SKIPPED, EXTENSION_COMPLETED]);

        let skipped = &sink.events_of_type(EXTENSION_SKIPPED)[0];
        assert_eq!(skipped.field("name"), Some(&json!("a")));
        assert_eq!(skipped.field("during_resolution"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_failing_extension_keeps_prior_state() {
        let sink = Arc::new(CollectingEventSink::new());
        let package = ExtensionPackage::new("demo")
            .with_stage("first", |init| Arc::new(SetOutputStage::operator(init.name, "first")))
            .with_stage("broken", |init| Arc::new(FailingStage::operator(init.name, "exploded")));
        let agent = dispatcher(package, sink.clone());

        let after = agent
            .run(state_with_extensions(&["first", "broken"]))
            .await
            .unwrap();

        assert_eq!(after.output(), Some("first"));
        let skipped = &sink.events_of_type(EXTENSION_SKIPPED)[0];
        assert_eq!(skipped.field("during_resolution"), Some(&json!(false)));
        assert!(skipped.field("reason").unwrap().as_str().unwrap().contains("exploded"));
    }

    #[tokio::test]
    async fn test_frame_shaped_extension_is_skipped() {
        let sink = Arc::new(CollectingEventSink::new());
        let package = ExtensionPackage::new("demo").with_stage("framey", |init| {
            Arc::new(FnStage::frame(init.name, |mut state: State| {
                state.set_output("should not land");
                Ok(state)
            }))
        });
        let agent = dispatcher(package, sink.clone());

        let before = state_with_extensions(&["framey"]);
        let after = agent.run(before.clone()).await.unwrap();

        assert_eq!(before, after);
        assert_eq!(sink.event_types(), vec![EXTENSION_SKIPPED]);
    }

    #[tokio::test]
    async fn test_no_extensions_is_passthrough() {
        let sink = Arc::new(CollectingEventSink::new());
        let agent = dispatcher(ExtensionPackage::new("empty"), sink.clone());

        let before = State::for_request("x", Map::new(), Map::new());
        let after = agent.run(before.clone()).await.unwrap();

        assert_eq!(before, after);
        assert!(sink.is_empty());
    }
}
