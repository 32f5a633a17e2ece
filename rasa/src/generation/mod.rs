//! The external text-generation capability.
//!
//! Stages only see the [`TextGenerator`] trait. The HTTP adapter for
//! Ollama, OpenAI and Claude lives behind the `http` feature.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpTextGenerator;

use crate::errors::ExternalCapabilityError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default sampling temperature for chat providers.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default completion length for chat providers.
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Optional generation parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl GenerationParams {
    /// Creates empty parameters (provider defaults apply).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the maximum token count.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Temperature or [`DEFAULT_TEMPERATURE`].
    #[must_use]
    pub fn temperature_or_default(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    /// Max tokens or [`DEFAULT_MAX_TOKENS`].
    #[must_use]
    pub fn max_tokens_or_default(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }
}

/// Accepts a prompt and returns generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates a response for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExternalCapabilityError`] when the backend fails.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ExternalCapabilityError>;
}
