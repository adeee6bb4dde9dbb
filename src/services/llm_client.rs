use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{json, Value};

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    services::formatting::truncate_chars,
};

/// Text-in, text-out access to a hosted language model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> AppResult<String>;

    fn model_name(&self) -> String;
}

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAiLanguageModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiLanguageModel {
    pub fn new(config: &Config, model: impl Into<String>) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_base(config.llm_api_base.clone());
        if let Some(key) = &config.llm_api_key {
            openai_config = openai_config.with_api_key(key.expose_secret());
        }

        Self {
            client: Client::with_config(openai_config),
            model: model.into(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
        }
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "messages": [
                { "role": "user", "content": prompt }
            ]
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiLanguageModel {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        log::info!(
            "Calling model {} with a {} character prompt",
            self.model,
            prompt.chars().count()
        );

        let response: Value = self
            .client
            .chat()
            .create_byot(self.request_body(prompt))
            .await
            .map_err(|err| AppError::from_provider_message(err.to_string()))?;

        let text = completion_text(&response)?;
        log::debug!("Model {} replied: {}", self.model, truncate_chars(&text, 500));
        Ok(text)
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}

/// Pulls the first choice's message text out of a chat-completions reply.
pub fn completion_text(response: &Value) -> AppResult<String> {
    let text = response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();

    if text.is_empty() {
        let reason = response
            .pointer("/choices/0/finish_reason")
            .and_then(Value::as_str)
            .unwrap_or("no choices");
        return Err(AppError::Upstream(format!(
            "model returned an empty response ({})",
            reason
        )));
    }
    Ok(text.to_string())
}
