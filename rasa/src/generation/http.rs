//! HTTP text generator for Ollama, OpenAI and Claude.

use super::{GenerationParams, TextGenerator};
use crate::config::LlmSettings;
use crate::errors::ExternalCapabilityError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const CLAUDE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    Ollama,
    OpenAi,
    Claude,
}

impl Provider {
    fn parse(name: &str) -> Result<Self, ExternalCapabilityError> {
        match name {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            "claude" => Ok(Self::Claude),
            other => Err(ExternalCapabilityError::UnsupportedProvider(other.to_string())),
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::Claude => "claude",
        }
    }
}

/// Calls a remote LLM over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTextGenerator {
    settings: LlmSettings,
    provider: Provider,
    client: reqwest::Client,
}

impl HttpTextGenerator {
    /// Creates a generator for the provider named in `settings`.
    ///
    /// # Errors
    ///
    /// Fails when the provider is unsupported or the HTTP client cannot be
    /// built.
    pub fn new(settings: LlmSettings) -> Result<Self, ExternalCapabilityError> {
        let provider = Provider::parse(&settings.provider_name())?;
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|err| ExternalCapabilityError::Request {
                provider: provider.as_str().to_string(),
                message: err.to_string(),
            })?;

        Ok(Self {
            settings,
            provider,
            client,
        })
    }

    /// Describes the configured backend without exposing secrets.
    #[must_use]
    pub fn info(&self) -> serde_json::Value {
        json!({
            "provider": self.provider.as_str(),
            "model": self.settings.effective_model(),
            "host": self.settings.host,
            "mode": self.settings.mode,
            "api_key_present": self.settings.api_key().is_some(),
        })
    }

    fn request_error(&self, err: &reqwest::Error) -> ExternalCapabilityError {
        ExternalCapabilityError::Request {
            provider: self.provider.as_str().to_string(),
            message: err.to_string(),
        }
    }

    fn invalid_response(&self, message: impl Into<String>) -> ExternalCapabilityError {
        ExternalCapabilityError::InvalidResponse {
            provider: self.provider.as_str().to_string(),
            message: message.into(),
        }
    }

    fn require_key(&self) -> Result<&str, ExternalCapabilityError> {
        self.settings
            .api_key()
            .ok_or_else(|| ExternalCapabilityError::MissingApiKey(self.provider.as_str().to_string()))
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ExternalCapabilityError> {
        let response = request
            .send()
            .await
            .map_err(|err| self.request_error(&err))?
            .error_for_status()
            .map_err(|err| self.request_error(&err))?;

        response
            .json::<T>()
            .await
            .map_err(|err| self.invalid_response(err.to_string()))
    }

    async fn ollama(&self, prompt: &str, params: &GenerationParams) -> Result<String, ExternalCapabilityError> {
        #[derive(Deserialize)]
        struct OllamaResponse {
            #[serde(default)]
            response: String,
        }

        let mut options = serde_json::Map::new();
        if let Some(temperature) = params.temperature {
            options.insert("temperature".into(), json!(temperature));
        }
        if let Some(max_tokens) = params.max_tokens {
            options.insert("num_predict".into(), json!(max_tokens));
        }

        let url = format!("{}/api/generate", self.settings.host.trim_end_matches('/'));
        let body = json!({
            "model": self.settings.effective_model(),
            "prompt": prompt,
            "options": options,
            "stream": false,
        });

        let parsed: OllamaResponse = self.post_json(self.client.post(url).json(&body)).await?;
        Ok(parsed.response)
    }

    async fn openai(&self, prompt: &str, params: &GenerationParams) -> Result<String, ExternalCapabilityError> {
        #[derive(Deserialize)]
        struct ChatMessage {
            content: Option<String>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChatMessage,
        }
        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        let key = self.require_key()?;
        let body = json!({
            "model": self.settings.effective_model(),
            "messages": [{"role": "user", "content": prompt}],
            "temperature": params.temperature_or_default(),
            "max_tokens": params.max_tokens_or_default(),
        });

        let parsed: ChatResponse = self
            .post_json(self.client.post(OPENAI_URL).bearer_auth(key).json(&body))
            .await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| self.invalid_response("no choices in response"))
    }

    async fn claude(&self, prompt: &str, params: &GenerationParams) -> Result<String, ExternalCapabilityError> {
        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(default)]
            text: String,
        }
        #[derive(Deserialize)]
        struct MessagesResponse {
            content: Vec<ContentBlock>,
        }

        let key = self.require_key()?;
        let body = json!({
            "model": self.settings.effective_model(),
            "max_tokens": params.max_tokens_or_default(),
            "messages": [{"role": "user", "content": prompt}],
            "temperature": params.temperature_or_default(),
        });

        let request = self
            .client
            .post(CLAUDE_URL)
            .header("x-api-key", key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let parsed: MessagesResponse = self.post_json(request).await?;

        parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text.trim().to_string())
            .ok_or_else(|| self.invalid_response("empty content in response"))
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ExternalCapabilityError> {
        debug!(provider = self.provider.as_str(), model = self.settings.effective_model(), "Generating text");
        match self.provider {
            Provider::Ollama => self.ollama(prompt, params).await,
            Provider::OpenAi => self.openai(prompt, params).await,
            Provider::Claude => self.claude(prompt, params).await,
        }
    }
}
