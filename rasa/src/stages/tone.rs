//! Rule-based tone rewriting of the final output.

use super::{Stage, StageKind};
use crate::errors::StageError;
use crate::state::State;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Appended by the friendly tone.
pub const FRIENDLY_SUFFIX: &str = " 😊 Let me know if you need more ideas.";
/// Appended by the poetic tone.
pub const POETIC_SUFFIX: &str = "\n\nLet your soul drift with the wind of new places.";
/// Output written when there is nothing to format.
pub const EMPTY_OUTPUT_MESSAGE: &str = "No response to format.";

/// A response tone, read from `metadata.tone`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Softer wording and a friendly sign-off.
    Friendly,
    /// Scenic wording and a poetic sign-off.
    Poetic,
    /// First sentence only.
    Concise,
    /// Leaves the text as it is.
    #[default]
    Passthrough,
}

impl Tone {
    /// Parses a tone name; unknown names map to [`Tone::Passthrough`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "friendly" => Self::Friendly,
            "poetic" => Self::Poetic,
            "concise" => Self::Concise,
            _ => Self::Passthrough,
        }
    }

    /// Rewrites `text` in this tone.
    #[must_use]
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::Friendly => {
                let softened = text
                    .replace("You should", "You might want to")
                    .replace("must", "could")
                    .replace('!', ".");
                format!("{}{FRIENDLY_SUFFIX}", softened.trim())
            }
            Self::Poetic => {
                let poetic = text
                    .replace("visit", "wander through")
                    .replace("peaceful", "serene")
                    .replace("city", "landscape");
                format!("{poetic}{POETIC_SUFFIX}")
            }
            Self::Concise => {
                let first = text.trim().split('.').next().unwrap_or_default();
                format!("{}.", first.trim())
            }
            Self::Passthrough => text.to_string(),
        }
    }
}

/// Rewrites `output` according to `metadata.tone`.
#[derive(Debug, Clone)]
pub struct ToneFormatter {
    name: String,
}

impl ToneFormatter {
    /// Creates a new tone formatter.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Stage for ToneFormatter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Operator
    }

    async fn run(&self, mut state: State) -> Result<State, StageError> {
        let tone = Tone::parse(state.tone());
        info!(stage = %self.name, ?tone, "Formatting output tone");

        let formatted = match state.output() {
            Some(output) if !output.is_empty() => tone.apply(output),
            _ => EMPTY_OUTPUT_MESSAGE.to_string(),
        };
        state.set_output(formatted);
        Ok(state)
    }
}
