//! Domain types shared across the generation pipeline.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PlanGenError;

/// Kind of plan a request produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    Training,
    Nutrition,
}

impl PlanKind {
    /// Top-level key the generated payload must carry.
    pub fn payload_key(&self) -> &'static str {
        match self {
            PlanKind::Training => "weeks",
            PlanKind::Nutrition => "days",
        }
    }
}

/// Most recent body measurements for the requesting user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyMetrics {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub body_fat_pct: Option<f64>,
    pub recorded_at: NaiveDate,
}

/// An active goal the plan should work towards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessGoal {
    pub description: String,
    pub target_date: Option<NaiveDate>,
}

/// Read-only user context, fetched by the caller before submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserContext {
    pub body_metrics: Option<BodyMetrics>,
    #[serde(default)]
    pub goals: Vec<FitnessGoal>,
    /// Free-text summary of the user's latest fitness assessment.
    pub assessment: Option<String>,
}

/// Quantitative targets, specific to the plan kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlanTargets {
    Training {
        duration_weeks: u32,
        sessions_per_week: u32,
        difficulty: String,
        focus: Option<String>,
    },
    Nutrition {
        duration_days: u32,
        daily_calories: u32,
        protein_pct: u32,
        carbs_pct: u32,
        fat_pct: u32,
        #[serde(default)]
        restrictions: Vec<String>,
    },
}

/// A fully described generation request. Never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub user_id: String,
    pub plan_name: String,
    pub targets: PlanTargets,
    #[serde(default)]
    pub context: UserContext,
}

impl GenerationRequest {
    pub fn kind(&self) -> PlanKind {
        match self.targets {
            PlanTargets::Training { .. } => PlanKind::Training,
            PlanTargets::Nutrition { .. } => PlanKind::Nutrition,
        }
    }

    /// Total number of days the plan covers.
    pub fn duration_days(&self) -> u32 {
        match self.targets {
            PlanTargets::Training { duration_weeks, .. } => duration_weeks * 7,
            PlanTargets::Nutrition { duration_days, .. } => duration_days,
        }
    }
}

/// A validated, ready-to-store plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPlan {
    pub plan_id: String,
    pub user_id: String,
    pub kind: PlanKind,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Plan content as returned by the provider, validated to contain the
    /// required top-level key for the plan kind.
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Persistence seam for finished plans.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn save_plan(&self, plan: &GeneratedPlan) -> Result<(), PlanGenError>;
}
