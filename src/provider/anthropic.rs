//! Client for the Anthropic messages API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PlanGenError;
use crate::provider::{LlmClient, ProviderConfig, REQUEST_TIMEOUT_SECS};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f64 = 0.7;
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug)]
pub struct AnthropicClient {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, PlanGenError> {
        if config.api_key.trim().is_empty() {
            return Err(PlanGenError::Config(
                "API key required for the Anthropic provider".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| PlanGenError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            config: config.clone(),
            client,
        })
    }
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    // Mandatory on this wire, unlike the other backends.
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn generate(&self, prompt: &str) -> Result<String, PlanGenError> {
        let base_url = self.config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let url = format!("{}/messages", base_url);

        let request_body = MessagesRequest {
            model: self
                .config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: self.config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: self.config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| PlanGenError::Provider(format!("Anthropic request failed: {}", e)))?;

        let status = response.status();
        let raw_body = response.text().await.map_err(|e| {
            PlanGenError::Provider(format!("Failed to read Anthropic response: {}", e))
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&raw_body)
                .map(|body| body.error.message)
                .unwrap_or(raw_body);
            return Err(PlanGenError::Provider(format!(
                "Anthropic returned HTTP {}: {}",
                status.as_u16(),
                message
            )));
        }

        let body: MessagesResponse = serde_json::from_str(&raw_body).map_err(|e| {
            PlanGenError::Provider(format!("Failed to parse Anthropic response: {}", e))
        })?;

        body.content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or_else(|| {
                PlanGenError::Provider("Anthropic response contained no content".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_field_path() {
        let parsed: MessagesResponse = serde_json::from_str(
            r#"{"content": [{"type": "text", "text": "{\"weeks\": []}"}], "role": "assistant"}"#,
        )
        .unwrap();
        assert_eq!(parsed.content[0].text, "{\"weeks\": []}");
    }

    #[test]
    fn test_error_body_field_path() {
        let parsed: ErrorResponse = serde_json::from_str(
            r#"{"type": "error", "error": {"type": "authentication_error", "message": "invalid x-api-key"}}"#,
        )
        .unwrap();
        assert_eq!(parsed.error.message, "invalid x-api-key");
    }
}
