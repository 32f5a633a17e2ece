//! End-to-end tests: persona → resolver → runner → dispatcher.

#[cfg(test)]
mod tests {
    use crate::errors::{ResolveError, StageError};
    use crate::events::{
        CollectingEventSink, EXTENSION_COMPLETED, EXTENSION_SKIPPED, PIPELINE_FAILED,
        STAGE_FAILED,
    };
    use crate::persona::Persona;
    use crate::pipeline::Runner;
    use crate::registry::{ExtensionPackage, ExtensionRegistry, StageRegistry, StageResolver};
    use crate::stages::{StageKind, StagePorts, ToneFormatter, UNCLEAR_REQUEST_MESSAGE};
    use crate::state::State;
    use crate::testing::{
        assert_output, assert_preserves_untouched, ExecutionLog, FailingStage, MockTextGenerator,
        RecordingStage, SetOutputStage,
    };
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn persona(value: Value) -> Persona {
        Persona::from_json_value(value).unwrap()
    }

    fn request(input: &str, preferences: Value, metadata: Value) -> State {
        let as_map = |value: Value| value.as_object().cloned().unwrap_or_default();
        State::for_request(input, as_map(preferences), as_map(metadata))
    }

    fn resolver(
        stages: StageRegistry,
        extensions: ExtensionRegistry,
        sink: Arc<CollectingEventSink>,
    ) -> StageResolver {
        StageResolver::new(
            Arc::new(stages),
            Arc::new(extensions),
            StagePorts::new().with_events(sink),
        )
    }

    #[tokio::test]
    async fn test_concise_end_to_end() {
        let stages = StageRegistry::new()
            .with_stage(StageKind::Frame, "entry_frame", |init| {
                Arc::new(SetOutputStage::frame(init.name, "Visit Paris. It is lovely. Enjoy."))
            })
            .with_stage(StageKind::Operator, "preference_operator", |init| {
                Arc::new(RecordingStage::new(init.name, StageKind::Operator, ExecutionLog::new()))
            })
            .with_stage(StageKind::Operator, "tone_operator", |init| {
                Arc::new(ToneFormatter::new(init.name))
            });
        let resolver = resolver(stages, ExtensionRegistry::new(), Arc::new(CollectingEventSink::new()));

        let runner = Runner::new(
            persona(json!({
                "name": "concise_guide",
                "frames": ["entry_frame"],
                "operators": ["preference_operator", "tone_operator"],
                "metadata": {"tone": "concise"},
            })),
            &resolver,
        )
        .unwrap();

        let state = runner
            .run(request("plan a trip.", json!({}), json!({})))
            .await
            .unwrap();
        assert_output(&state, "Visit Paris.");
    }

    #[tokio::test]
    async fn test_each_stage_resolved_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = builds.clone();
        let log = ExecutionLog::new();
        let stage_log = log.clone();

        let stages = StageRegistry::new()
            .with_stage(StageKind::Frame, "counted_frame", move |init| {
                counter.fetch_add(1, Ordering::SeqCst);
                Arc::new(RecordingStage::new(init.name, StageKind::Frame, stage_log.clone()))
            });
        let resolver = resolver(stages, ExtensionRegistry::new(), Arc::new(CollectingEventSink::new()));

        let runner = Runner::new(
            persona(json!({"name": "counted", "frames": ["counted_frame"]})),
            &resolver,
        )
        .unwrap();
        assert_eq!(builds.load(Ordering::SeqCst), 1);

        for _ in 0..3 {
            runner.run(request("x", json!({}), json!({}))).await.unwrap();
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(log.entries().len(), 3);
    }

    #[tokio::test]
    async fn test_order_is_frames_then_operators() {
        let log = ExecutionLog::new();
        let mut stages = StageRegistry::new();
        for (kind, name) in [
            (StageKind::Operator, "op_z"),
            (StageKind::Frame, "frame_b"),
            (StageKind::Operator, "op_a"),
            (StageKind::Frame, "frame_a"),
        ] {
            let log = log.clone();
            stages.register(kind, name, move |init| {
                Arc::new(RecordingStage::new(init.name, kind, log.clone()))
            });
        }
        let resolver = resolver(stages, ExtensionRegistry::new(), Arc::new(CollectingEventSink::new()));

        let runner = Runner::new(
            persona(json!({
                "name": "ordered",
                "frames": ["frame_b", "frame_a"],
                "operators": ["op_z", "op_a"],
            })),
            &resolver,
        )
        .unwrap();
        runner.run(request("x", json!({}), json!({}))).await.unwrap();

        assert_eq!(log.entries(), vec!["frame_b", "frame_a", "op_z", "op_a"]);
    }

    #[tokio::test]
    async fn test_builtin_stages_preserve_unrelated_keys() {
        let sink = Arc::new(CollectingEventSink::new());
        let runner = Runner::new(
            persona(json!({
                "name": "all_builtins",
                "frames": ["stateless_frame", "session_frame", "short_term_frame", "long_term_frame", "persona_frame"],
                "operators": ["preference_agent", "heuristic_agent", "critic_agent", "tone_formatter"],
                "metadata": {"tone": "friendly"},
            })),
            &resolver(StageRegistry::builtins(), ExtensionRegistry::new(), sink),
        )
        .unwrap();

        let before = request("Where to?", json!({"Region": "Asia"}), json!({}))
            .with_field("itinerary", json!({"nested": [1, 2, 3]}));
        let after = runner.run(before.clone()).await.unwrap();

        assert_preserves_untouched(&before, &after, &["context", "metadata", "output"]);
        assert_eq!(
            after.context().unwrap().get("preferences"),
            Some(&json!({"region": "asia"}))
        );
        assert_eq!(after.output(), Some("No response to format."));
        assert!(after.contains_key("critic_agent"));
    }

    #[tokio::test]
    async fn test_dispatcher_skips_unresolvable_and_runs_the_rest() {
        let sink = Arc::new(CollectingEventSink::new());
        let extensions = ExtensionRegistry::new().with_package(
            ExtensionPackage::new("demo")
                .with_stage("b", |init| Arc::new(SetOutputStage::operator(init.name, "from b"))),
        );
        let runner = Runner::new(
            persona(json!({
                "name": "dispatching",
                "frames": ["stateless_frame"],
                "operators": ["heuristic_agent"],
                "domain_operators": ["a", "b"],
            })),
            &resolver(StageRegistry::builtins(), extensions, sink.clone()),
        )
        .unwrap();

        let state = runner
            .run(request("anything", json!({}), json!({})))
            .await
            .unwrap();

        assert_output(&state, "from b");
        let skipped = sink.events_of_type(EXTENSION_SKIPPED);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].field("name"), Some(&json!("a")));
        assert_eq!(sink.events_of_type(EXTENSION_COMPLETED).len(), 1);
    }

    #[tokio::test]
    async fn test_dispatcher_survives_failing_extension() {
        let sink = Arc::new(CollectingEventSink::new());
        let extensions = ExtensionRegistry::new().with_package(
            ExtensionPackage::new("demo")
                .with_stage("good", |init| Arc::new(SetOutputStage::operator(init.name, "good")))
                .with_stage("bad", |init| Arc::new(FailingStage::operator(init.name, "boom"))),
        );
        let runner = Runner::new(
            persona(json!({
                "name": "resilient",
                "frames": ["stateless_frame"],
                "operators": ["heuristic_agent", "tone_formatter"],
                "metadata": {"tone": "concise"},
                "domain_operators": ["good", "bad"],
            })),
            &resolver(StageRegistry::builtins(), extensions, sink.clone()),
        )
        .unwrap();

        let state = runner
            .run(request("anything", json!({}), json!({})))
            .await
            .unwrap();

        assert_output(&state, "good.");
        assert!(sink.events_of_type(PIPELINE_FAILED).is_empty());
    }

    #[tokio::test]
    async fn test_declared_extension_as_operator() {
        let extensions = ExtensionRegistry::new().with_package(
            ExtensionPackage::new("demo")
                .with_stage("domain_answer", |init| Arc::new(SetOutputStage::operator(init.name, "domain"))),
        );
        let runner = Runner::new(
            persona(json!({
                "name": "direct",
                "frames": ["stateless_frame"],
                "operators": ["domain_answer"],
                "domain_operators": ["domain_answer"],
            })),
            &resolver(StageRegistry::builtins(), extensions, Arc::new(CollectingEventSink::new())),
        )
        .unwrap();

        let state = runner.run(request("x", json!({}), json!({}))).await.unwrap();
        assert_output(&state, "domain");
    }

    #[tokio::test]
    async fn test_blank_input_flows_to_fallback() {
        let runner = Runner::new(
            persona(json!({"name": "blank", "frames": ["stateless_frame"]})),
            &StageResolver::builtin(),
        )
        .unwrap();

        for input in ["", "   "] {
            let state = runner.run(request(input, json!({}), json!({}))).await.unwrap();
            assert_output(&state, UNCLEAR_REQUEST_MESSAGE);
            assert!(state.context().is_none());
        }
    }

    #[tokio::test]
    async fn test_stage_error_aborts_run_unchanged() {
        let sink = Arc::new(CollectingEventSink::new());
        let log = ExecutionLog::new();
        let after_log = log.clone();
        let stages = StageRegistry::builtins()
            .with_stage(StageKind::Operator, "exploding_agent", |init| {
                Arc::new(FailingStage::operator(init.name, "kaboom"))
            })
            .with_stage(StageKind::Operator, "never_reached", move |init| {
                Arc::new(RecordingStage::new(init.name, StageKind::Operator, after_log.clone()))
            });
        let runner = Runner::new(
            persona(json!({
                "name": "explosive",
                "frames": ["stateless_frame"],
                "operators": ["exploding_agent", "never_reached"],
            })),
            &resolver(stages, ExtensionRegistry::new(), sink.clone()),
        )
        .unwrap();

        let err = runner.run(request("x", json!({}), json!({}))).await.unwrap_err();

        match err {
            StageError::Execution { stage, message } => {
                assert_eq!(stage, "exploding_agent");
                assert_eq!(message, "kaboom");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(log.entries().is_empty());
        assert_eq!(sink.events_of_type(STAGE_FAILED).len(), 1);
        assert_eq!(sink.events_of_type(PIPELINE_FAILED).len(), 1);
    }

    #[tokio::test]
    async fn test_generator_failure_is_external_error() {
        let resolver = StageResolver::new(
            Arc::new(StageRegistry::builtins()),
            Arc::new(ExtensionRegistry::new()),
            StagePorts::new().with_text_generator(Arc::new(MockTextGenerator::failing("offline"))),
        );
        let runner = Runner::new(
            persona(json!({"name": "llm", "frames": ["stateless_frame"], "operators": ["tone_formatter"]})),
            &resolver,
        )
        .unwrap();

        let err = runner.run(request("hello", json!({}), json!({}))).await.unwrap_err();
        assert!(matches!(err, StageError::External(_)));
    }

    #[tokio::test]
    async fn test_generator_output_is_toned() {
        let resolver = StageResolver::new(
            Arc::new(StageRegistry::builtins()),
            Arc::new(ExtensionRegistry::new()),
            StagePorts::new().with_text_generator(Arc::new(MockTextGenerator::new(vec![
                "You should visit Kyoto!".to_string(),
            ]))),
        );
        let runner = Runner::new(
            persona(json!({
                "name": "llm",
                "frames": ["stateless_frame"],
                "operators": ["tone_formatter"],
                "metadata": {"tone": "friendly"},
            })),
            &resolver,
        )
        .unwrap();

        let state = runner.run(request("ideas?", json!({}), json!({}))).await.unwrap();
        assert_output(
            &state,
            "You might want to visit Kyoto. 😊 Let me know if you need more ideas.",
        );
    }

    #[test]
    fn test_unknown_frame_is_configuration_error() {
        let err = Runner::new(
            persona(json!({"name": "ghost", "frames": ["ghost_frame"]})),
            &StageResolver::builtin(),
        )
        .unwrap_err();

        assert!(matches!(err, ResolveError::Unknown(_)));
        assert!(crate::errors::RasaError::from(err).is_configuration_error());
    }
}
