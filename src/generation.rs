//! Generation orchestrator: drives prompt building, the provider call, and
//! payload extraction/validation, with exponential backoff between attempts.

use chrono::{Days, Utc};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::error::PlanGenError;
use crate::extractor;
use crate::prompt;
use crate::provider::LlmClient;
use crate::types::{GeneratedPlan, GenerationRequest};

/// Owns the attempt loop for a single generation request.
pub struct PlanGenerator {
    client: Box<dyn LlmClient>,
    retry: RetryConfig,
}

impl PlanGenerator {
    pub fn new(client: Box<dyn LlmClient>, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    /// Run the full attempt loop for `request`.
    ///
    /// Transient provider failures and unusable payloads are retried alike,
    /// each retry preceded by `base * 2^(attempt-1)` of backoff. The
    /// caller's cancellation token aborts a backoff wait or an in-flight
    /// call immediately; cancellation is a distinct outcome, not counted as
    /// exhaustion.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GeneratedPlan, PlanGenError> {
        let mut last_error: Option<PlanGenError> = None;

        for attempt in 0..=self.retry.max_retries {
            if attempt > 0 {
                let delay = self.retry.base_backoff() * 2u32.pow(attempt - 1);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "waiting before retry");
                tokio::select! {
                    _ = cancel.cancelled() => return Err(PlanGenError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let rendered = prompt::build_prompt(request);
            let response = tokio::select! {
                _ = cancel.cancelled() => return Err(PlanGenError::Cancelled),
                result = self.client.generate(&rendered) => result,
            };

            let raw = match response {
                Ok(text) => text,
                Err(e) if e.is_retryable() => {
                    warn!(attempt, error = %e, "generation attempt failed");
                    last_error = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            match parse_payload(&raw, request.kind().payload_key()) {
                Ok(payload) => return Ok(assemble_plan(request, payload)),
                Err(e) => {
                    warn!(attempt, error = %e, "response payload rejected");
                    last_error = Some(e);
                }
            }
        }

        let attempts = self.retry.max_retries + 1;
        let last_error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no error recorded".to_string());
        Err(PlanGenError::Exhausted {
            attempts,
            last_error,
        })
    }
}

/// Extract, parse and validate the structured payload in `raw`.
///
/// A bare top-level array is accepted and wrapped under `key`, for backends
/// that drop the outer envelope.
fn parse_payload(raw: &str, key: &str) -> Result<Value, PlanGenError> {
    let fragment = extractor::extract_payload(raw).ok_or_else(|| {
        PlanGenError::Parse("response contains no JSON object or array".to_string())
    })?;

    let value: Value = serde_json::from_str(fragment)
        .map_err(|e| PlanGenError::Parse(format!("extracted payload is not valid JSON: {}", e)))?;

    let object = match value {
        Value::Object(_) => value,
        Value::Array(entries) => serde_json::json!({ key: entries }),
        _ => {
            return Err(PlanGenError::Parse(
                "payload is neither an object nor an array".to_string(),
            ))
        }
    };

    match object.get(key) {
        Some(Value::Array(entries)) if !entries.is_empty() => Ok(object),
        Some(Value::Array(_)) => Err(PlanGenError::Parse(format!("\"{}\" is empty", key))),
        Some(_) => Err(PlanGenError::Parse(format!("\"{}\" is not an array", key))),
        None => Err(PlanGenError::Parse(format!(
            "payload is missing the \"{}\" field",
            key
        ))),
    }
}

fn assemble_plan(request: &GenerationRequest, payload: Value) -> GeneratedPlan {
    let start_date = Utc::now().date_naive();
    let end_date = start_date + Days::new(u64::from(request.duration_days()));
    GeneratedPlan {
        plan_id: uuid::Uuid::new_v4().to_string(),
        user_id: request.user_id.clone(),
        kind: request.kind(),
        name: request.plan_name.clone(),
        start_date,
        end_date,
        payload,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PlanTargets, UserContext};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    /// Test double that replays scripted outcomes and counts calls.
    #[derive(Debug)]
    struct ScriptedClient {
        responses: Mutex<VecDeque<Result<String, String>>>,
        calls: AtomicU32,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Result<String, String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                calls: AtomicU32::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn generate(&self, _prompt: &str) -> Result<String, PlanGenError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(PlanGenError::Provider(message)),
                None => Err(PlanGenError::Provider("script exhausted".to_string())),
            }
        }
    }

    // Lets a test keep a handle on the script while the generator owns the
    // boxed client.
    #[async_trait]
    impl LlmClient for Arc<ScriptedClient> {
        async fn generate(&self, prompt: &str) -> Result<String, PlanGenError> {
            self.as_ref().generate(prompt).await
        }
    }

    fn training_request() -> GenerationRequest {
        GenerationRequest {
            user_id: "u1".to_string(),
            plan_name: "Base block".to_string(),
            targets: PlanTargets::Training {
                duration_weeks: 2,
                sessions_per_week: 3,
                difficulty: "beginner".to_string(),
                focus: None,
            },
            context: UserContext::default(),
        }
    }

    fn retry(max_retries: u32, base_backoff_ms: u64) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_backoff_ms,
        }
    }

    const VALID_RESPONSE: &str = "Here you go: {\"weeks\": [{\"week\": 1, \"sessions\": []}]}";

    #[tokio::test]
    async fn test_first_attempt_success() {
        let client = ScriptedClient::new(vec![Ok(VALID_RESPONSE.to_string())]);
        let generator = PlanGenerator::new(Box::new(client), retry(2, 10));
        let request = training_request();

        let plan = generator
            .generate(&request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(plan.user_id, "u1");
        assert_eq!(plan.name, "Base block");
        assert!(!plan.plan_id.is_empty());
        assert_eq!((plan.end_date - plan.start_date).num_days(), 14);
        assert!(plan.payload["weeks"].is_array());
    }

    #[tokio::test]
    async fn test_exhaustion_counts_all_attempts() {
        let client = ScriptedClient::new(vec![
            Err("connection refused".to_string()),
            Err("connection refused".to_string()),
            Err("HTTP 503".to_string()),
        ]);
        let generator = PlanGenerator::new(Box::new(client), retry(2, 10));
        let request = training_request();

        let err = generator
            .generate(&request, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            PlanGenError::Exhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("HTTP 503"));
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_call_count_bounded_by_max_retries() {
        let client = Arc::new(ScriptedClient::new(vec![
            Err("down".to_string()),
            Err("down".to_string()),
            Err("down".to_string()),
            Ok(VALID_RESPONSE.to_string()),
        ]));

        let generator = PlanGenerator::new(Box::new(client.clone()), retry(2, 10));
        let request = training_request();

        let result = generator.generate(&request, &CancellationToken::new()).await;
        assert!(result.is_err());
        // The fourth scripted response would have succeeded, but the loop
        // stops at max_retries + 1 calls.
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_parse_failure_retried_like_call_failure() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok("I'm sorry, I can only help with fitness topics.".to_string()),
            Ok(VALID_RESPONSE.to_string()),
        ]));

        let generator = PlanGenerator::new(Box::new(client.clone()), retry(2, 10));
        let request = training_request();

        let plan = generator
            .generate(&request, &CancellationToken::new())
            .await
            .unwrap();
        assert!(plan.payload["weeks"].is_array());
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_bare_array_wrapped_under_expected_key() {
        let client = ScriptedClient::new(vec![Ok(
            "[{\"week\": 1, \"sessions\": []}] as requested".to_string()
        )]);
        let generator = PlanGenerator::new(Box::new(client), retry(0, 10));
        let request = training_request();

        let plan = generator
            .generate(&request, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(plan.payload["weeks"][0]["week"], 1);
    }

    #[tokio::test]
    async fn test_missing_required_key_is_rejected() {
        let client = ScriptedClient::new(vec![Ok("{\"days\": [{\"day\": 1}]}".to_string())]);
        let generator = PlanGenerator::new(Box::new(client), retry(0, 10));
        let request = training_request();

        let err = generator
            .generate(&request, &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            PlanGenError::Exhausted { last_error, .. } => {
                assert!(last_error.contains("weeks"));
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_backoff_delays_sum() {
        let client = ScriptedClient::new(vec![
            Err("down".to_string()),
            Err("down".to_string()),
            Err("down".to_string()),
        ]);
        let generator = PlanGenerator::new(Box::new(client), retry(2, 50));
        let request = training_request();

        let started = Instant::now();
        let result = generator.generate(&request, &CancellationToken::new()).await;
        let elapsed = started.elapsed();

        assert!(result.is_err());
        // Two backoff waits: 50ms + 100ms.
        assert!(elapsed >= Duration::from_millis(150), "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_cancellation_during_backoff_is_prompt() {
        let client = ScriptedClient::new(vec![
            Err("down".to_string()),
            Err("down".to_string()),
            Err("down".to_string()),
            Err("down".to_string()),
        ]);
        // Long enough that a full backoff wait would dominate the test.
        let generator = PlanGenerator::new(Box::new(client), retry(3, 5_000));
        let request = training_request();
        let cancel = CancellationToken::new();

        let task = {
            let cancel = cancel.clone();
            tokio::spawn(async move { generator.generate(&request, &cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        let started = Instant::now();
        cancel.cancel();
        let result = task.await.unwrap();

        assert!(matches!(result, Err(PlanGenError::Cancelled)));
        assert!(started.elapsed() < Duration::from_millis(500));
    }
}
