use super::{Stage, StageKind};
use crate::errors::StageError;
use crate::state::State;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// Written under the stage's own name by [`CriticAgent`].
const CRITIQUE_PLACEHOLDER: &str = "critic_agent: Not implemented";

/// Placeholder critic operator.
///
/// Records a top-level field named after the stage and leaves every other
/// key alone.
#[derive(Debug, Clone)]
pub struct CriticAgent {
    name: String,
}

impl CriticAgent {
    /// Creates a new critic.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Stage for CriticAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Operator
    }

    async fn run(&self, mut state: State) -> Result<State, StageError> {
        debug!(stage = %self.name, "Critique skipped");
        state.set(self.name.clone(), Value::String(CRITIQUE_PLACEHOLDER.to_string()));
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::testing::assert_changed_keys;

    #[tokio::test]
    async fn test_writes_placeholder_critique() {
        let critic = CriticAgent::new("critic_agent");
        let before = State::new()
            .with_field("output", json!("Go."))
            .with_field("context", json!({"intent": "general_request"}));
        let after = critic.run(before.clone()).await.unwrap();

        assert_eq!(
            after.get("critic_agent"),
            Some(&json!("critic_agent: Not implemented"))
        );
        assert_changed_keys(&before, &after, &["critic_agent"]);
    }
}
