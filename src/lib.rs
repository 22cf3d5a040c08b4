//! Asynchronous plan-generation engine for a fitness-planning service.
//!
//! Accepts a request for a multi-day training or nutrition plan, delegates
//! content generation to an interchangeable external text-generation
//! backend, retries transient failures with exponential backoff, recovers
//! the structured payload from free-form model output, and exposes progress
//! through pollable task records.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use plangen::{
//!     GeneratedPlan, GenerationRequest, PlanGenError, PlanRepository, PlanService,
//!     PlanTargets, ProviderConfig, ServiceConfig, UserContext,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! struct NoopRepository;
//!
//! #[async_trait::async_trait]
//! impl PlanRepository for NoopRepository {
//!     async fn save_plan(&self, _plan: &GeneratedPlan) -> Result<(), PlanGenError> {
//!         Ok(())
//!     }
//! }
//!
//! # async fn demo() -> Result<(), PlanGenError> {
//! let service = PlanService::new(Arc::new(NoopRepository), ServiceConfig::default());
//!
//! let request = GenerationRequest {
//!     user_id: "user-1".to_string(),
//!     plan_name: "Spring strength block".to_string(),
//!     targets: PlanTargets::Training {
//!         duration_weeks: 8,
//!         sessions_per_week: 4,
//!         difficulty: "intermediate".to_string(),
//!         focus: Some("strength".to_string()),
//!     },
//!     context: UserContext::default(),
//! };
//! let provider = ProviderConfig {
//!     provider: None, // falls back to the configured default
//!     api_key: "sk-...".to_string(),
//!     base_url: None,
//!     model: None,
//!     max_tokens: None,
//!     temperature: None,
//! };
//!
//! let submission = service.submit(request, provider, CancellationToken::new())?;
//! // Poll until the task reaches a terminal state.
//! let _status = service.status(&submission.task_id);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod extractor;
pub mod generation;
pub mod prompt;
pub mod provider;
pub mod service;
pub mod tasks;
pub mod types;

pub use config::{RetryConfig, ServiceConfig};
pub use error::PlanGenError;
pub use generation::PlanGenerator;
pub use provider::{build_client, LlmClient, ProviderConfig, ProviderKind};
pub use service::{ConnectivityReport, PlanService, Submission};
pub use tasks::{TaskRecord, TaskRegistry, TaskState};
pub use types::{
    BodyMetrics, FitnessGoal, GeneratedPlan, GenerationRequest, PlanKind, PlanRepository,
    PlanTargets, UserContext,
};
