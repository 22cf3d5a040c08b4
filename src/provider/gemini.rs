//! Client for the Google Gemini generateContent API.
//!
//! Unlike the other backends, Gemini takes the credential as a URL query
//! parameter rather than a header, so surfaced errors must not echo the
//! request URL.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PlanGenError;
use crate::provider::{LlmClient, ProviderConfig, REQUEST_TIMEOUT_SECS};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_MAX_TOKENS: u32 = 8192;
const DEFAULT_TEMPERATURE: f64 = 0.7;

#[derive(Debug)]
pub struct GeminiClient {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, PlanGenError> {
        if config.api_key.trim().is_empty() {
            return Err(PlanGenError::Config(
                "API key required for the Gemini provider".to_string(),
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
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
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
impl LlmClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, PlanGenError> {
        let base_url = self.config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let model = self.config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        // The URL carries the credential.
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            base_url, model, self.config.api_key
        );

        let request_body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                max_output_tokens: self.config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                PlanGenError::Provider(format!("Gemini request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        let raw_body = response.text().await.map_err(|e| {
            PlanGenError::Provider(format!(
                "Failed to read Gemini response: {}",
                e.without_url()
            ))
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&raw_body)
                .map(|body| body.error.message)
                .unwrap_or(raw_body);
            return Err(PlanGenError::Provider(format!(
                "Gemini returned HTTP {}: {}",
                status.as_u16(),
                message
            )));
        }

        let body: GenerateResponse = serde_json::from_str(&raw_body).map_err(|e| {
            PlanGenError::Provider(format!("Failed to parse Gemini response: {}", e))
        })?;

        body.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| {
                PlanGenError::Provider("Gemini response contained no candidates".to_string())
            })
    }
}
