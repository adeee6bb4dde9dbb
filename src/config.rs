use std::{env, time::Duration};

use secrecy::SecretString;

use crate::services::retry::RetryPolicy;

pub const DEFAULT_LLM_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,https://tenzzen-app.vercel.app";

#[derive(Clone, Debug)]
pub struct Config {
    pub llm_api_key: Option<SecretString>,
    pub llm_api_base: String,
    pub llm_model: String,
    pub llm_fast_model: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    pub llm_max_retries: u32,
    pub llm_retry_base_delay_secs: u64,
    pub youtube_api_key: Option<SecretString>,
    pub youtube_api_base: String,
    pub search_api_key: Option<SecretString>,
    pub search_api_endpoint: Option<String>,
    pub allowed_origins: Vec<String>,
    pub web_server_host: String,
    pub web_server_port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            llm_api_key: secret_var("GOOGLE_GENERATIVE_AI_API_KEY")
                .or_else(|| secret_var("GOOGLE_API_KEY")),
            llm_api_base: env::var("LLM_API_BASE")
                .unwrap_or_else(|_| DEFAULT_LLM_API_BASE.to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "gemini-2.5-pro".to_string()),
            llm_fast_model: env::var("LLM_FAST_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            llm_temperature: parsed_var("LLM_TEMPERATURE").unwrap_or(0.2),
            llm_max_tokens: parsed_var("LLM_MAX_TOKENS").unwrap_or(8192),
            llm_max_retries: parsed_var("LLM_MAX_RETRIES").unwrap_or(5),
            llm_retry_base_delay_secs: parsed_var("LLM_RETRY_BASE_DELAY_SECS").unwrap_or(6),
            youtube_api_key: secret_var("YOUTUBE_API_KEY"),
            youtube_api_base: env::var("YOUTUBE_API_BASE")
                .unwrap_or_else(|_| DEFAULT_YOUTUBE_API_BASE.to_string()),
            search_api_key: secret_var("SEARCH_API_KEY"),
            search_api_endpoint: env::var("SEARCH_API_ENDPOINT")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            allowed_origins: parse_origins(
                &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string()),
            ),
            web_server_host: env::var("WEB_SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_server_port: parsed_var("PORT").unwrap_or(8001),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.llm_max_retries,
            Duration::from_secs(self.llm_retry_base_delay_secs),
        )
    }

    pub fn search_configured(&self) -> bool {
        self.search_api_key.is_some() && self.search_api_endpoint.is_some()
    }

    /// Names of the credentials that are not set. The service still starts
    /// without them, but the dependent features degrade to fallbacks.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.llm_api_key.is_none() {
            missing.push("GOOGLE_GENERATIVE_AI_API_KEY");
        }
        if self.youtube_api_key.is_none() {
            missing.push("YOUTUBE_API_KEY");
        }
        if self.search_api_key.is_none() {
            missing.push("SEARCH_API_KEY");
        }
        if self.search_api_endpoint.is_none() {
            missing.push("SEARCH_API_ENDPOINT");
        }
        missing
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            llm_api_key: Some(SecretString::from("test-llm-key".to_string())),
            llm_api_base: "http://127.0.0.1:9/v1".to_string(),
            llm_model: "test-pro".to_string(),
            llm_fast_model: "test-flash".to_string(),
            llm_temperature: 0.2,
            llm_max_tokens: 1024,
            llm_max_retries: 2,
            llm_retry_base_delay_secs: 0,
            youtube_api_key: None,
            youtube_api_base: "http://127.0.0.1:9/youtube/v3".to_string(),
            search_api_key: None,
            search_api_endpoint: None,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 8001,
        }
    }
}

fn secret_var(name: &str) -> Option<SecretString> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
