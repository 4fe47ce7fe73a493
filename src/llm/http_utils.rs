//! HTTP utilities for the LLM provider

use crate::llm::LlmError;
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;

/// Maximum number of characters of an upstream error body kept in `LlmError`.
const ERROR_BODY_LIMIT: usize = 500;

/// Creates an HTTP client whose every request is bounded by `timeout`.
///
/// # Errors
///
/// Returns `LlmError::NetworkError` if the TLS backend cannot be initialised.
pub fn create_http_client(timeout: Duration) -> Result<HttpClient, LlmError> {
    HttpClient::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::NetworkError(e.to_string()))
}

/// Sends an HTTP POST request with JSON body and returns parsed JSON response.
///
/// # Errors
///
/// Returns `LlmError::Timeout` if the request exceeds the client timeout,
/// `LlmError::NetworkError` on connectivity issues, `LlmError::ApiError` on
/// non-success status codes, or `LlmError::JsonError` if parsing fails.
pub async fn send_json_request(
    client: &HttpClient,
    url: &str,
    body: &Value,
    auth_header: Option<&str>,
) -> Result<Value, LlmError> {
    let mut request = client.post(url).json(body);

    if let Some(auth) = auth_header {
        request = request.header("Authorization", auth);
    }

    let response = request.send().await.map_err(map_transport_error)?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();

        // Nginx/proxy error pages are noise in logs
        let is_html = error_text.trim_start().starts_with("<!DOCTYPE")
            || error_text.trim_start().starts_with("<html")
            || error_text.trim_start().starts_with("<HTML");

        let clean_message = if is_html {
            format!("{status} (Server returned HTML error page)")
        } else {
            let truncated: String = error_text.chars().take(ERROR_BODY_LIMIT).collect();
            format!("{status} - {truncated}")
        };

        return Err(LlmError::ApiError(clean_message));
    }

    response.json().await.map_err(|e| {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::JsonError(e.to_string())
        }
    })
}

fn map_transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::NetworkError(e.to_string())
    }
}

/// Extracts text content from a JSON response by navigating a path.
///
/// Numeric segments index into arrays, everything else is an object key.
///
/// # Errors
///
/// Returns `LlmError::JsonError` if the path is invalid or the target is not a string.
pub fn extract_text_content(response: &Value, path: &[&str]) -> Result<String, LlmError> {
    let mut current = response;

    for segment in path {
        if let Ok(index) = segment.parse::<usize>() {
            current = current.get(index).ok_or_else(|| {
                LlmError::JsonError(format!("Invalid path: missing index {index}"))
            })?;
        } else {
            current = current.get(*segment).ok_or_else(|| {
                LlmError::JsonError(format!("Invalid path: missing key {segment}"))
            })?;
        }
    }

    current
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| LlmError::JsonError(format!("Expected string at path, got: {current}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_openai_style_content() -> Result<(), LlmError> {
        let response = json!({
            "choices": [{"message": {"role": "assistant", "content": "42"}}]
        });

        let text = extract_text_content(&response, &["choices", "0", "message", "content"])?;
        assert_eq!(text, "42");
        Ok(())
    }

    #[test]
    fn test_extract_reports_missing_segments() {
        let path = ["choices", "0", "message", "content"];

        let err = extract_text_content(&json!({"choices": []}), &path);
        assert!(matches!(err, Err(LlmError::JsonError(msg)) if msg.contains("index 0")));

        let err = extract_text_content(&json!({"choices": [{"message": {"content": null}}]}), &path);
        assert!(matches!(err, Err(LlmError::JsonError(_))));
    }
}
