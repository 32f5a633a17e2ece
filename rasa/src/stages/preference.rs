//! Preference normalisation operator.

use super::{Stage, StageKind};
use crate::errors::StageError;
use crate::state::{keys, State};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::info;

/// Copies normalised `preferences` into `context.preferences`.
///
/// Keys and string values are trimmed and lower-cased; other values are
/// copied as-is.
#[derive(Debug, Clone)]
pub struct PreferenceAgent {
    name: String,
}

impl PreferenceAgent {
    /// Creates a new preference agent.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn normalise(preferences: &Map<String, Value>) -> Map<String, Value> {
        preferences
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(text) => Value::String(text.trim().to_lowercase()),
                    other => other.clone(),
                };
                (key.trim().to_lowercase(), value)
            })
            .collect()
    }
}

#[async_trait]
impl Stage for PreferenceAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Operator
    }

    async fn run(&self, mut state: State) -> Result<State, StageError> {
        info!(stage = %self.name, "Applying user preferences");

        let normalised = match state.preferences() {
            Some(preferences) if !preferences.is_empty() => Self::normalise(preferences),
            _ => {
                info!(stage = %self.name, "No preferences found in state");
                return Ok(state);
            }
        };

        state
            .section_mut(keys::CONTEXT)
            .ok_or_else(|| StageError::invalid_state(&self.name, "context is not an object"))?
            .insert(keys::PREFERENCES.to_string(), Value::Object(normalised));

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_normalises_into_context() {
        let agent = PreferenceAgent::new("preference_agent");
        let state = State::new()
            .with_field("preferences", json!({" Region ": " Europe", "Budget": 1200}))
            .with_field("context", json!({"intent": "general_request"}));

        let after = agent.run(state).await.unwrap();

        assert_eq!(
            after.get("context"),
            Some(&json!({
                "intent": "general_request",
                "preferences": {"region": "europe", "budget": 1200}
            }))
        );
        assert_eq!(
            after.get("preferences"),
            Some(&json!({" Region ": " Europe", "Budget": 1200}))
        );
    }

    #[tokio::test]
    async fn test_missing_or_empty_preferences_pass_through() {
        let agent = PreferenceAgent::new("preference_agent");

        for before in [
            State::new().with_field("user_input", json!("hi")),
            State::new().with_field("preferences", json!({})),
        ] {
            let after = agent.run(before.clone()).await.unwrap();
            assert_eq!(before, after);
        }
    }

    #[tokio::test]
    async fn test_non_object_context_is_rejected() {
        let agent = PreferenceAgent::new("preference_agent");
        let state = State::new()
            .with_field("preferences", json!({"a": "b"}))
            .with_field("context", json!([]));

        let err = agent.run(state).await.unwrap_err();
        assert!(matches!(err, StageError::InvalidState { .. }));
    }
}
