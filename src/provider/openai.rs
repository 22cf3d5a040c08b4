//! Client for the OpenAI chat-completions API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PlanGenError;
use crate::provider::{LlmClient, ProviderConfig, REQUEST_TIMEOUT_SECS};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f64 = 0.7;

#[derive(Debug)]
pub struct OpenAiClient {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, PlanGenError> {
        if config.api_key.trim().is_empty() {
            return Err(PlanGenError::Config(
                "API key required for the OpenAI provider".to_string(),
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
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
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
impl LlmClient for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String, PlanGenError> {
        let base_url = self.config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let url = format!("{}/chat/completions", base_url);

        let request_body = ChatRequest {
            model: self
                .config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: self.config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| PlanGenError::Provider(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        let raw_body = response.text().await.map_err(|e| {
            PlanGenError::Provider(format!("Failed to read OpenAI response: {}", e))
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&raw_body)
                .map(|body| body.error.message)
                .unwrap_or(raw_body);
            return Err(PlanGenError::Provider(format!(
                "OpenAI returned HTTP {}: {}",
                status.as_u16(),
                message
            )));
        }

        let body: ChatResponse = serde_json::from_str(&raw_body).map_err(|e| {
            PlanGenError::Provider(format!("Failed to parse OpenAI response: {}", e))
        })?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| PlanGenError::Provider("OpenAI response contained no choices".to_string()))
    }
}
