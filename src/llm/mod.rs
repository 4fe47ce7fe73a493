//! LLM client
//!
//! A single chat-completion call against a DeepSeek (OpenAI-compatible) API.

pub mod deepseek;
mod http_utils;

pub use deepseek::DeepSeekProvider;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// The request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Error returned by the provider's API
    #[error("API error: {0}")]
    ApiError(String),
    /// Error during network communication
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Error during JSON serialization or deserialization
    #[error("JSON error: {0}")]
    JsonError(String),
}

/// A message in an LLM conversation
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Message {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Text content of the message
    pub content: String,
}

impl Message {
    /// Create a new system message
    #[must_use]
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    /// Create a new user message
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// Interface for chat-completion backends
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Answer `user_message` under `system_prompt`. One attempt, no retry.
    async fn chat_completion(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String, LlmError>;
}
