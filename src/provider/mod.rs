//! Uniform client abstraction over external text-generation backends.
//!
//! Each backend speaks its own wire schema and authentication style; the
//! [`LlmClient`] trait hides those differences behind a single "send a
//! prompt, get text back" capability. Retry policy lives with the
//! orchestrator, above this layer: every call here is exactly one outbound
//! request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PlanGenError;

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod stub;

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use stub::StubClient;

/// Fixed timeout applied to every outbound generation call.
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Prompt used to verify connectivity without generating real content.
const CONNECTIVITY_PROMPT: &str = "Reply with the single word: ok";

/// Per-request provider configuration, supplied by the caller.
///
/// The credential arrives already decrypted; this crate never stores it
/// beyond the lifetime of one generation request. Unset fields take
/// backend-specific defaults inside each concrete client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider name, e.g. "openai". `None` selects the service default.
    pub provider: Option<String>,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

/// Supported text-generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
    Stub,
}

impl ProviderKind {
    /// Resolve a provider name. An unrecognized name is a configuration
    /// error, reported before any network activity.
    pub fn from_name(name: &str) -> Result<Self, PlanGenError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "gemini" => Ok(ProviderKind::Gemini),
            "stub" => {
                // The stub backend performs no real generation; keep it out
                // of production unless explicitly enabled.
                let allow = cfg!(test)
                    || std::env::var("PLANGEN_ALLOW_STUB")
                        .map(|v| v == "1" || v == "true")
                        .unwrap_or(false);
                if allow {
                    Ok(ProviderKind::Stub)
                } else {
                    Err(PlanGenError::Config(
                        "Stub provider is not allowed in production. Set PLANGEN_ALLOW_STUB=1 to enable it (for testing only).".to_string(),
                    ))
                }
            }
            other => Err(PlanGenError::Config(format!(
                "Unknown provider \"{}\" (expected one of: openai, anthropic, gemini)",
                other
            ))),
        }
    }
}

/// Uniform capability over heterogeneous text-generation backends.
#[async_trait]
pub trait LlmClient: Send + Sync + std::fmt::Debug {
    /// Send `prompt` to the backend and return the generated text.
    /// Exactly one outbound call; no retries at this layer.
    async fn generate(&self, prompt: &str) -> Result<String, PlanGenError>;

    /// Cheap connectivity probe: a generation call with a trivial prompt.
    async fn verify_connectivity(&self) -> Result<(), PlanGenError> {
        self.generate(CONNECTIVITY_PROMPT).await.map(|_| ())
    }
}

/// Create the client for `config`, dispatching on the resolved provider
/// name. Fails fast on configuration problems; performs no network calls.
pub fn build_client(
    config: &ProviderConfig,
    default_provider: &str,
) -> Result<Box<dyn LlmClient>, PlanGenError> {
    let name = config.provider.as_deref().unwrap_or(default_provider);
    match ProviderKind::from_name(name)? {
        ProviderKind::OpenAi => Ok(Box::new(OpenAiClient::new(config)?)),
        ProviderKind::Anthropic => Ok(Box::new(AnthropicClient::new(config)?)),
        ProviderKind::Gemini => Ok(Box::new(GeminiClient::new(config)?)),
        ProviderKind::Stub => Ok(Box::new(StubClient::new())),
    }
}
