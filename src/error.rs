use thiserror::Error;

/// Errors produced by the plan generation engine.
///
/// Configuration problems fail fast without any network activity; provider
/// and payload problems are transient and retried by the orchestrator;
/// cancellation and storage failures are terminal outcomes of their own.
#[derive(Debug, Error)]
pub enum PlanGenError {
    /// Invalid or missing configuration. Never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// The text-generation backend failed: network error, non-success
    /// response, or an unusable response body.
    #[error("provider error: {0}")]
    Provider(String),

    /// The response text did not contain a usable plan payload.
    #[error("invalid plan payload: {0}")]
    Parse(String),

    /// The caller's cancellation signal fired during a backoff wait or an
    /// in-flight provider call.
    #[error("plan generation cancelled")]
    Cancelled,

    /// The finished plan could not be persisted.
    #[error("storage error: {0}")]
    Storage(String),

    /// Every attempt failed; wraps the last error seen.
    #[error("plan generation failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

impl PlanGenError {
    /// Whether another generation attempt could reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlanGenError::Provider(_) | PlanGenError::Parse(_))
    }
}
