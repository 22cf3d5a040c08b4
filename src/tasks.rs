//! In-memory registry of generation task status records.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Lifecycle state of a generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

/// Pollable status record for one generation task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub task_id: String,
    pub state: TaskState,
    /// Advisory completion indicator, 0-100, never decreasing.
    pub progress: u8,
    pub message: String,
    /// Populated only in the failed state.
    pub error: Option<String>,
    /// Populated only in the completed state.
    pub result: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Thread-safe store of task records, shared between the submission path,
/// the background generation units and status-polling callers.
///
/// The lock is held only across map access, never across an await point.
/// Records live for the process lifetime; reaping old ones is an operator
/// concern outside this subsystem.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    inner: Arc<RwLock<HashMap<String, TaskRecord>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Allocate a new pending record and return its identifier.
    pub fn create(&self) -> String {
        let task_id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let record = TaskRecord {
            task_id: task_id.clone(),
            state: TaskState::Pending,
            progress: 0,
            message: "queued for generation".to_string(),
            error: None,
            result: None,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().unwrap().insert(task_id.clone(), record);
        task_id
    }

    /// Overwrite the mutable fields of `task_id` in one atomic step.
    ///
    /// Unknown identifiers are ignored: updates arrive from fire-and-forget
    /// background units. Records already in a terminal state are left
    /// untouched, and `error`/`result` are only kept for the terminal state
    /// they belong to.
    pub fn update(
        &self,
        task_id: &str,
        state: TaskState,
        progress: u8,
        message: impl Into<String>,
        error: Option<String>,
        result: Option<Value>,
    ) {
        let mut map = self.inner.write().unwrap();
        let record = match map.get_mut(task_id) {
            Some(record) => record,
            None => return,
        };
        if record.state.is_terminal() {
            return;
        }
        record.state = state;
        record.progress = record.progress.max(progress.min(100));
        record.message = message.into();
        record.error = if state == TaskState::Failed { error } else { None };
        record.result = if state == TaskState::Completed {
            result
        } else {
            None
        };
        record.updated_at = Utc::now();
    }

    /// Current record for `task_id`, if the identifier is known to this
    /// process.
    pub fn get(&self, task_id: &str) -> Option<TaskRecord> {
        self.inner.read().unwrap().get(task_id).cloned()
    }
}
