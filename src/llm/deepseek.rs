use super::http_utils::{create_http_client, extract_text_content, send_json_request};
use super::{LlmError, LlmProvider, Message};
use crate::config::Settings;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

/// Path of the answer inside an OpenAI-style completion response
const CONTENT_PATH: [&str; 4] = ["choices", "0", "message", "content"];

/// LLM provider for DeepSeek and other OpenAI-compatible chat endpoints
pub struct DeepSeekProvider {
    http_client: HttpClient,
    api_key: String,
    api_base: String,
    model: String,
}

impl DeepSeekProvider {
    /// Create a provider with an explicit endpoint, model and timeout.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::NetworkError` if the HTTP client cannot be built.
    pub fn new(
        api_key: String,
        api_base: &str,
        model: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            http_client: create_http_client(timeout)?,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
        })
    }

    /// Create a provider from application settings.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::NetworkError` if the HTTP client cannot be built.
    pub fn from_settings(settings: &Settings) -> Result<Self, LlmError> {
        Self::new(
            settings.deepseek_api_key.clone(),
            &settings.llm_api_base,
            settings.llm_model.clone(),
            settings.llm_timeout(),
        )
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl LlmProvider for DeepSeekProvider {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn chat_completion(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "messages": [Message::system(system_prompt), Message::user(user_message)],
        });

        debug!("Sending completion request");
        let auth = format!("Bearer {}", self.api_key);
        let response =
            send_json_request(&self.http_client, &self.completions_url(), &body, Some(&auth))
                .await?;

        extract_text_content(&response, &CONTENT_PATH)
    }
}
