//! Stage trait and the built-in stages.
//!
//! Stages are the units of work a persona pipeline is made of. Frames run
//! first and enrich context; operators run after every frame and transform
//! the state into a response.

mod critic;
mod entry;
pub mod heuristic;
mod ports;
mod preference;
mod tone;

pub use critic::CriticAgent;
pub use entry::{MemoryFrame, StatelessFrame, UNCLEAR_REQUEST_MESSAGE};
pub use heuristic::HeuristicAgent;
pub use ports::StagePorts;
pub use preference::PreferenceAgent;
pub use tone::{Tone, ToneFormatter, EMPTY_OUTPUT_MESSAGE, FRIENDLY_SUFFIX, POETIC_SUFFIX};

use crate::errors::StageError;
use crate::state::State;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// The two execution phases a stage can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Context/memory enrichment, runs before any operator.
    Frame,
    /// Reasoning/transformation, runs after all frames.
    Operator,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame => write!(f, "frame"),
            Self::Operator => write!(f, "operator"),
        }
    }
}

/// Trait for pipeline stages.
///
/// A stage consumes the current state and returns the next one. Keys the
/// stage does not touch must come back unchanged.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name the stage was resolved under.
    fn name(&self) -> &str;

    /// Returns the phase this stage implements.
    fn kind(&self) -> StageKind;

    /// Runs the stage.
    ///
    /// # Errors
    ///
    /// Any error aborts the pipeline run, except inside the heuristic
    /// dispatcher where extension failures are skipped.
    async fn run(&self, state: State) -> Result<State, StageError>;
}

/// A simple function-based stage.
pub struct FnStage<F>
where
    F: Fn(State) -> Result<State, StageError> + Send + Sync,
{
    name: String,
    kind: StageKind,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(State) -> Result<State, StageError> + Send + Sync,
{
    /// Creates a function-based frame stage.
    pub fn frame(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            kind: StageKind::Frame,
            func,
        }
    }

    /// Creates a function-based operator stage.
    pub fn operator(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            kind: StageKind::Operator,
            func,
        }
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(State) -> Result<State, StageError> + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(State) -> Result<State, StageError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self, state: State) -> Result<State, StageError> {
        (self.func)(state)
    }
}
