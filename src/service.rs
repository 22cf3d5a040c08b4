//! Submission, status and connectivity surface over the generation engine.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::ServiceConfig;
use crate::error::PlanGenError;
use crate::generation::PlanGenerator;
use crate::provider::{self, ProviderConfig};
use crate::tasks::{TaskRecord, TaskRegistry, TaskState};
use crate::types::{GenerationRequest, PlanRepository};

/// Immediate response to a plan submission.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub task_id: String,
    pub state: TaskState,
    pub message: String,
}

/// Outcome of a provider connectivity check.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectivityReport {
    pub ok: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
}

/// Front door of the generation subsystem: accepts requests, runs each
/// generation in a detached unit, and answers status polls.
pub struct PlanService {
    registry: TaskRegistry,
    repository: Arc<dyn PlanRepository>,
    config: ServiceConfig,
}

impl PlanService {
    pub fn new(repository: Arc<dyn PlanRepository>, config: ServiceConfig) -> Self {
        Self {
            registry: TaskRegistry::new(),
            repository,
            config,
        }
    }

    /// Accept a generation request and return its task identifier
    /// immediately, never blocking on the generation itself.
    ///
    /// Configuration problems (unknown provider, missing credential) are
    /// reported synchronously without consuming a task slot; everything
    /// later is reported through the task record. Must be called from
    /// within a Tokio runtime.
    pub fn submit(
        &self,
        request: GenerationRequest,
        provider: ProviderConfig,
        cancel: CancellationToken,
    ) -> Result<Submission, PlanGenError> {
        let client = provider::build_client(&provider, &self.config.default_provider)?;

        let task_id = self.registry.create();
        info!(task_id = %task_id, user_id = %request.user_id, "plan generation accepted");

        let generator = PlanGenerator::new(client, self.config.retry.clone());
        let registry = self.registry.clone();
        let repository = Arc::clone(&self.repository);
        let id = task_id.clone();
        tokio::spawn(async move {
            run_generation(registry, repository, generator, id, request, cancel).await;
        });

        Ok(Submission {
            task_id,
            state: TaskState::Pending,
            message: "plan generation started".to_string(),
        })
    }

    /// Current status of a previously submitted task. Identifiers are only
    /// valid within this process lifetime.
    pub fn status(&self, task_id: &str) -> Option<TaskRecord> {
        self.registry.get(task_id)
    }

    /// Round-trip probe of a provider, reporting latency and the raw error
    /// message on failure. Configuration problems surface as `Err`.
    pub async fn check_provider(
        &self,
        provider: ProviderConfig,
    ) -> Result<ConnectivityReport, PlanGenError> {
        let client = provider::build_client(&provider, &self.config.default_provider)?;
        let started = Instant::now();
        let outcome = client.verify_connectivity().await;
        let latency_ms = started.elapsed().as_millis() as u64;
        Ok(match outcome {
            Ok(()) => ConnectivityReport {
                ok: true,
                latency_ms,
                error: None,
            },
            Err(e) => ConnectivityReport {
                ok: false,
                latency_ms,
                error: Some(e.to_string()),
            },
        })
    }
}

/// Detached generation unit: everything from prompt building to the final
/// registry update happens here, decoupled from the submission call.
async fn run_generation(
    registry: TaskRegistry,
    repository: Arc<dyn PlanRepository>,
    generator: PlanGenerator,
    task_id: String,
    request: GenerationRequest,
    cancel: CancellationToken,
) {
    registry.update(
        &task_id,
        TaskState::Processing,
        10,
        "generating plan",
        None,
        None,
    );

    let plan = match generator.generate(&request, &cancel).await {
        Ok(plan) => plan,
        Err(e) => {
            error!(task_id = %task_id, error = %e, "plan generation failed");
            registry.update(
                &task_id,
                TaskState::Failed,
                0,
                "plan generation failed",
                Some(e.to_string()),
                None,
            );
            return;
        }
    };

    registry.update(&task_id, TaskState::Processing, 90, "storing plan", None, None);

    if let Err(e) = repository.save_plan(&plan).await {
        error!(task_id = %task_id, error = %e, "failed to store generated plan");
        registry.update(
            &task_id,
            TaskState::Failed,
            0,
            "failed to store generated plan",
            Some(e.to_string()),
            None,
        );
        return;
    }

    let result = match serde_json::to_value(&plan) {
        Ok(value) => value,
        Err(e) => {
            registry.update(
                &task_id,
                TaskState::Failed,
                0,
                "failed to encode generated plan",
                Some(e.to_string()),
                None,
            );
            return;
        }
    };

    info!(task_id = %task_id, plan_id = %plan.plan_id, "plan generation completed");
    registry.update(
        &task_id,
        TaskState::Completed,
        100,
        "plan generation completed",
        None,
        Some(result),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GeneratedPlan, PlanTargets, UserContext};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct MemoryRepository {
        plans: Mutex<Vec<GeneratedPlan>>,
    }

    impl MemoryRepository {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                plans: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PlanRepository for MemoryRepository {
        async fn save_plan(&self, plan: &GeneratedPlan) -> Result<(), PlanGenError> {
            self.plans.lock().unwrap().push(plan.clone());
            Ok(())
        }
    }

    struct FailingRepository;

    #[async_trait]
    impl PlanRepository for FailingRepository {
        async fn save_plan(&self, _plan: &GeneratedPlan) -> Result<(), PlanGenError> {
            Err(PlanGenError::Storage("database unavailable".to_string()))
        }
    }

    fn request() -> GenerationRequest {
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

    fn stub_provider() -> ProviderConfig {
        ProviderConfig {
            provider: Some("stub".to_string()),
            api_key: String::new(),
            base_url: None,
            model: None,
            max_tokens: None,
            temperature: None,
        }
    }

    async fn wait_terminal(service: &PlanService, task_id: &str) -> TaskRecord {
        for _ in 0..200 {
            if let Some(record) = service.status(task_id) {
                if record.state.is_terminal() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task {} did not reach a terminal state in time", task_id);
    }

    #[tokio::test]
    async fn test_unknown_provider_rejected_without_task() {
        let service = PlanService::new(MemoryRepository::new(), ServiceConfig::default());
        let mut provider = stub_provider();
        provider.provider = Some("unknown-backend".to_string());

        let err = service
            .submit(request(), provider, CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, PlanGenError::Config(_)));
    }

    #[tokio::test]
    async fn test_submit_returns_pending_then_completes() {
        let repository = MemoryRepository::new();
        let service = PlanService::new(repository.clone(), ServiceConfig::default());

        let submission = service
            .submit(request(), stub_provider(), CancellationToken::new())
            .unwrap();
        assert_eq!(submission.state, TaskState::Pending);

        let record = wait_terminal(&service, &submission.task_id).await;
        assert_eq!(record.state, TaskState::Completed);
        assert_eq!(record.progress, 100);
        assert!(record.error.is_none());
        let result = record.result.unwrap();
        assert!(result["payload"]["weeks"].is_array());

        let stored = repository.plans.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].user_id, "u1");
    }

    #[tokio::test]
    async fn test_storage_failure_fails_task_after_generation() {
        let service = PlanService::new(Arc::new(FailingRepository), ServiceConfig::default());

        let submission = service
            .submit(request(), stub_provider(), CancellationToken::new())
            .unwrap();
        let record = wait_terminal(&service, &submission.task_id).await;

        assert_eq!(record.state, TaskState::Failed);
        assert!(record.result.is_none());
        assert!(record.error.unwrap().contains("database unavailable"));
    }

    #[tokio::test]
    async fn test_status_unknown_task() {
        let service = PlanService::new(MemoryRepository::new(), ServiceConfig::default());
        assert!(service.status("not-a-task").is_none());
    }

    #[tokio::test]
    async fn test_check_provider_reports_latency() {
        let service = PlanService::new(MemoryRepository::new(), ServiceConfig::default());
        let report = service.check_provider(stub_provider()).await.unwrap();
        assert!(report.ok);
        assert!(report.error.is_none());
    }
}
