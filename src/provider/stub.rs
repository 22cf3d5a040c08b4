//! Deterministic in-process backend for tests and local development.

use async_trait::async_trait;

use crate::error::PlanGenError;
use crate::provider::LlmClient;

/// Returns canned plan documents without any network traffic. The payload
/// shape is chosen from the prompt text: nutrition prompts get a `days`
/// document, everything else a `weeks` document. Responses are wrapped in
/// prose the way real backends tend to answer.
#[derive(Debug, Default)]
pub struct StubClient;

impl StubClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LlmClient for StubClient {
    async fn generate(&self, prompt: &str) -> Result<String, PlanGenError> {
        if prompt.to_lowercase().contains("nutrition") {
            Ok(r#"Here is your nutrition plan:
{"days": [{"day": 1, "meals": [{"name": "Oatmeal with berries", "time": "08:00", "calories": 420, "protein_g": 18, "carbs_g": 62, "fat_g": 10}], "total_calories": 420}]}
Enjoy!"#
                .to_string())
        } else {
            Ok(r#"Here is your training plan:
{"weeks": [{"week": 1, "sessions": [{"day": "Monday", "focus": "Full body", "exercises": [{"name": "Squat", "sets": 3, "reps": "8-10", "rest_seconds": 120}]}]}]}
Enjoy!"#
                .to_string())
        }
    }
}
