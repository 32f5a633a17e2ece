//! Benchmarks for pipeline compilation and execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rasa::persona::Persona;
use rasa::pipeline::Runner;
use rasa::registry::StageResolver;
use rasa::state::State;
use serde_json::{json, Map};

fn persona() -> Persona {
    let persona = Persona::from_json_value(json!({
        "name": "bench",
        "frames": ["stateless_frame", "session_frame"],
        "operators": ["preference_agent", "heuristic_agent", "critic_agent", "tone_formatter"],
        "metadata": {"tone": "friendly"},
    }));
    match persona {
        Ok(persona) => persona,
        Err(err) => panic!("invalid bench persona: {err}"),
    }
}

fn pipeline_benchmark(c: &mut Criterion) {
    let resolver = StageResolver::builtin();

    c.bench_function("compile", |b| {
        b.iter(|| black_box(Runner::new(persona(), &resolver).is_ok()));
    });

    let Ok(runner) = Runner::new(persona(), &resolver) else {
        return;
    };
    let Ok(runtime) = tokio::runtime::Builder::new_current_thread().build() else {
        return;
    };

    let mut preferences = Map::new();
    preferences.insert("Region".into(), json!(" Europe "));
    let request = State::for_request("Plan a quiet weekend", preferences, Map::new());

    c.bench_function("run", |b| {
        b.iter(|| black_box(runtime.block_on(runner.run(request.clone())).is_ok()));
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
