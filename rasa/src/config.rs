//! Settings read from the process environment.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Text-generation backend settings.
    #[serde(default)]
    pub llm: LlmSettings,
    /// Verbose diagnostics.
    #[serde(default)]
    pub debug: bool,
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a numeric or boolean variable cannot be
    /// parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a numeric or boolean variable cannot be
    /// parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: fn() -> String| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(default)
        };

        let request_timeout_secs = match lookup("REQUEST_TIMEOUT_SECS")
            .filter(|value| !value.trim().is_empty())
        {
            Some(raw) => raw.trim().parse::<u64>().map_err(|err| {
                ConfigError::new("REQUEST_TIMEOUT_SECS", &raw, err.to_string())
            })?,
            None => default_timeout_secs(),
        };

        let debug = match lookup("DEBUG") {
            Some(raw) => parse_bool("DEBUG", &raw)?,
            None => false,
        };

        let llm = LlmSettings {
            mode: get("LLM_MODE", default_mode),
            provider: get("LLM_PROVIDER", default_provider),
            model: get("LLM_MODEL", default_model),
            host: get("LLM_HOST", default_host),
            openai_api_key: lookup("OPENAI_API_KEY").filter(|key| !key.is_empty()),
            openai_model: get("OPENAI_MODEL", default_openai_model),
            claude_api_key: lookup("CLAUDE_API_KEY").filter(|key| !key.is_empty()),
            claude_model: get("CLAUDE_MODEL", default_claude_model),
            request_timeout_secs,
        };

        Ok(Self { llm, debug })
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ConfigError::new(key, raw, "expected true or false")),
    }
}

/// Settings for the text-generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// `local` or `cloud`; informational.
    #[serde(default = "default_mode")]
    pub mode: String,
    /// `ollama`, `openai` or `claude`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model used by the local provider.
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of the local provider.
    #[serde(default = "default_host")]
    pub host: String,
    /// OpenAI API key.
    #[serde(default, skip_serializing)]
    pub openai_api_key: Option<String>,
    /// OpenAI model.
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Anthropic API key.
    #[serde(default, skip_serializing)]
    pub claude_api_key: Option<String>,
    /// Anthropic model.
    #[serde(default = "default_claude_model")]
    pub claude_model: String,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_mode() -> String {
    "local".to_string()
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_claude_model() -> String {
    "claude-3-opus".to_string()
}

const fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            provider: default_provider(),
            model: default_model(),
            host: default_host(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            claude_api_key: None,
            claude_model: default_claude_model(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmSettings {
    /// Creates settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the provider.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Sets the local model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the local host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Provider name, lower-cased.
    #[must_use]
    pub fn provider_name(&self) -> String {
        self.provider.trim().to_lowercase()
    }

    /// The model for the configured provider.
    #[must_use]
    pub fn effective_model(&self) -> &str {
        match self.provider_name().as_str() {
            "openai" => &self.openai_model,
            "claude" => &self.claude_model,
            _ => &self.model,
        }
    }

    /// The API key for the configured provider; local providers need none.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        match self.provider_name().as_str() {
            "openai" => self.openai_api_key.as_deref(),
            "claude" => self.claude_api_key.as_deref(),
            _ => None,
        }
    }

    /// Request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
