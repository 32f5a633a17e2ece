//! # RASA
//!
//! Persona-driven stage pipelines.
//!
//! A persona declares an ordered list of **frames** (context and memory
//! enrichment) and **operators** (reasoning and formatting). The engine
//! resolves those names against registration tables, compiles them into a
//! linear stage graph and runs it over a shared [`State`](state::State):
//!
//! - **Resolution**: built-in stages plus caller-supplied extension packages
//! - **Execution**: strictly sequential, frames first, fail-fast
//! - **Delegation**: `heuristic_agent` runs persona extensions best-effort
//! - **Observability**: `tracing` spans and structured pipeline events
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rasa::prelude::*;
//!
//! let persona = Persona::from_yaml_file("apps/travel_concierge/persona.yaml")?;
//! let resolver = StageResolver::builtin();
//! let runner = Runner::new(persona, &resolver)?;
//!
//! let state = runner
//!     .run(State::for_request("Somewhere quiet?", preferences, metadata))
//!     .await?;
//! println!("{}", state.output().unwrap_or_default());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod errors;
pub mod events;
pub mod generation;
pub mod persona;
pub mod pipeline;
pub mod registry;
pub mod stages;
pub mod state;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{LlmSettings, Settings};
    pub use crate::errors::{
        ExtensionStageFailure, PersonaError, RasaError, ResolveError, ResolveKind, StageError,
    };
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, PipelineEvent,
    };
    pub use crate::generation::{GenerationParams, TextGenerator};
    pub use crate::persona::{Persona, PersonaCatalog};
    pub use crate::pipeline::{Runner, StageGraph};
    pub use crate::registry::{
        ExtensionPackage, ExtensionRegistry, StageInit, StageRegistry, StageResolver,
    };
    pub use crate::stages::{FnStage, Stage, StageKind, StagePorts};
    pub use crate::state::{RunResponse, State};
}
