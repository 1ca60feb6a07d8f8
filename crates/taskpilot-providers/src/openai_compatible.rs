//! Unified OpenAI-compatible provider.
//!
//! One struct handles chat completions for every OpenAI-compatible API
//! (Gemini's compatibility endpoint, OpenAI, Ollama, custom servers).
//! Providers differ only by endpoint URL, auth style and API key.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use taskpilot_core::config::LlmConfig;
use taskpilot_core::error::{PilotError, Result};
use taskpilot_core::traits::TextGenerator;

use crate::provider_registry::{AuthStyle, ProviderConfig};

/// Instruction prepended to every command.
pub const ASSISTANT_PROMPT: &str = "You are an AI executive assistant. Answer the user's command \
with a clear, actionable response in a helpful, professional tone. When the command involves \
scheduling, email or task management, spell out the concrete actions that should be taken.";

/// A provider that works with any OpenAI-compatible API.
pub struct OpenAiCompatibleProvider {
    /// Provider name (e.g., "gemini", "openai").
    name: String,
    api_key: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    base_url: String,
    /// Path for chat completions (e.g., "/chat/completions").
    chat_path: String,
    model: String,
    auth_style: AuthStyle,
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    /// Create from a registry entry + `[llm]` config.
    ///
    /// Resolution order:
    /// - API key: `llm.api_key` > registry env vars > empty
    /// - Base URL: `llm.endpoint` > env override > registry default
    pub fn from_registry(registry: &ProviderConfig, config: &LlmConfig) -> Result<Self> {
        let api_key = if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            registry
                .env_keys
                .iter()
                .find_map(|key| std::env::var(key).ok())
                .unwrap_or_default()
        };

        let base_url = if !config.endpoint.is_empty() {
            config.endpoint.trim_end_matches('/').to_string()
        } else {
            registry
                .base_url_env
                .and_then(|env_key| {
                    let val = std::env::var(env_key).ok()?;
                    // OLLAMA_HOST is usually given without the /v1 suffix
                    if val.ends_with("/v1") {
                        Some(val)
                    } else {
                        Some(format!("{}/v1", val.trim_end_matches('/')))
                    }
                })
                .unwrap_or_else(|| registry.base_url.to_string())
        };

        let model = if config.model.is_empty() {
            registry.default_model.to_string()
        } else {
            config.model.clone()
        };

        Ok(Self {
            name: registry.name.to_string(),
            api_key,
            base_url,
            chat_path: registry.chat_path.to_string(),
            model,
            auth_style: registry.auth_style,
            client: build_client(config.timeout_secs)?,
        })
    }

    /// Create for a custom endpoint (e.g., "custom:https://my-server.com/v1").
    pub fn custom(endpoint: &str, config: &LlmConfig) -> Result<Self> {
        let base_url = endpoint
            .strip_prefix("custom:")
            .unwrap_or(endpoint)
            .trim_end_matches('/')
            .to_string();
        if base_url.is_empty() {
            return Err(PilotError::Config("custom provider needs a URL".into()));
        }

        let api_key = if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            std::env::var("CUSTOM_API_KEY").unwrap_or_default()
        };

        let auth_style = if api_key.is_empty() {
            AuthStyle::None
        } else {
            AuthStyle::Bearer
        };

        Ok(Self {
            name: "custom".to_string(),
            api_key,
            base_url,
            chat_path: "/chat/completions".to_string(),
            model: config.model.clone(),
            auth_style,
            client: build_client(config.timeout_secs)?,
        })
    }

    /// Whether the provider has what it needs to authenticate.
    pub fn has_credentials(&self) -> bool {
        self.auth_style == AuthStyle::None || !self.api_key.is_empty()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the auth header for the request.
    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_style {
            AuthStyle::Bearer if !self.api_key.is_empty() => req.bearer_auth(&self.api_key),
            _ => req,
        }
    }
}

fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|e| PilotError::Http(format!("client build: {e}")))
}

/// Chat-completions request body for one command.
pub fn build_request_body(model: &str, command: &str) -> Value {
    json!({
        "model": model,
        "temperature": 0.7,
        "messages": [
            { "role": "system", "content": ASSISTANT_PROMPT },
            { "role": "user", "content": command },
        ],
    })
}

/// Pull the first choice's text out of a chat-completions response.
pub fn parse_reply(json: &Value) -> Result<String> {
    let choice = json["choices"]
        .get(0)
        .ok_or_else(|| PilotError::Provider("No choices in response".into()))?;
    choice["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PilotError::Provider("Empty content in response".into()))
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process_command(&self, text: &str) -> Result<String> {
        if !self.has_credentials() {
            return Err(PilotError::ApiKeyMissing(self.name.clone()));
        }

        let url = format!("{}{}", self.base_url, self.chat_path);
        let body = build_request_body(&self.model, text);
        let req = self.apply_auth(self.client.post(&url).json(&body));

        let resp = req.send().await.map_err(|e| {
            PilotError::Http(format!("{} connection failed ({}): {}", self.name, url, e))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(PilotError::Provider(format!(
                "{} API error {}: {}",
                self.name, status, text
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| PilotError::Http(e.to_string()))?;
        let reply = parse_reply(&json)?;
        tracing::debug!("{} replied with {} chars", self.name, reply.len());
        Ok(reply)
    }
}
