use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f64,
    pub max_output_tokens: u32,
    /// Overrides the backend's default model.
    pub model_id: Option<String>,
}

impl CompletionOptions {
    pub fn new(temperature: f64, max_output_tokens: u32) -> Self {
        Self {
            temperature,
            max_output_tokens,
            model_id: None,
        }
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self::new(0.2, 2000)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
}

/// Text-generation backend: a message list in, one completion out.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TextBackend: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> AppResult<Completion>;
}

/// OpenAI-compatible chat-completions endpoint.
pub struct HttpChatBackend {
    client: reqwest::Client,
    url: String,
    token: SecretString,
    default_model: String,
}

impl HttpChatBackend {
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.backend_timeout_seconds))
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.backend_url.clone(),
            token: config.backend_token.clone(),
            default_model: config.backend_model.clone(),
        })
    }

    fn request_body(&self, messages: &[ChatMessage], options: &CompletionOptions) -> serde_json::Value {
        json!({
            "model": options.model_id.as_deref().unwrap_or(&self.default_model),
            "messages": messages,
            "temperature": options.temperature,
            "max_tokens": options.max_output_tokens,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn completion_text(response: ChatCompletionResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .unwrap_or_default()
}

#[async_trait]
impl TextBackend for HttpChatBackend {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> AppResult<Completion> {
        log::debug!(
            "Calling backend with {} messages (temperature {}, max_tokens {})",
            messages.len(),
            options.temperature,
            options.max_output_tokens
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.token.expose_secret())
            .json(&self.request_body(messages, options))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Backend responded with status {}", status);
            return Err(AppError::BackendError {
                status: Some(status.as_u16()),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        Ok(Completion {
            text: completion_text(parsed),
        })
    }
}
