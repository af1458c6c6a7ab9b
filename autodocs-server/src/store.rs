//! In-memory task state.
//!
//! Records are owned by the store; callers get clones. Every operation runs
//! under a single lock that is never held across an await point.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Lifecycle of a task: `queued → running → {done, error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Running,
    Done,
    Error,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Error)
    }

    /// Whether `self → next` is a forward step.
    fn can_become(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Queued, TaskStatus::Running)
                | (TaskStatus::Running, TaskStatus::Done)
                | (TaskStatus::Running, TaskStatus::Error)
        ) || self == next
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Queued => write!(f, "queued"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Done => write!(f, "done"),
            TaskStatus::Error => write!(f, "error"),
        }
    }
}

/// One pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub status: TaskStatus,
    pub repo_path: String,
    pub output_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskRecord {
    pub fn queued(repo_path: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Queued,
            repo_path: repo_path.into(),
            output_path: output_path.into(),
            research: None,
            markdown_path: None,
            deployment: None,
            error: None,
        }
    }
}

/// Fields to merge into a record. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub status: Option<TaskStatus>,
    pub research: Option<serde_json::Value>,
    pub markdown_path: Option<String>,
    pub deployment: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Error),
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("task {0} already exists")]
    Duplicate(String),
    #[error("task {0} not found")]
    NotFound(String),
    #[error("task {0} is already {1}")]
    Finalized(String, TaskStatus),
    #[error("task {id}: cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: TaskStatus,
        to: TaskStatus,
    },
}

/// Task state shared by request handlers and background runs.
pub trait TaskStore: Send + Sync {
    fn create(&self, id: &str, record: TaskRecord) -> Result<(), StoreError>;
    fn update(&self, id: &str, patch: TaskPatch) -> Result<(), StoreError>;
    fn get(&self, id: &str) -> Option<TaskRecord>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store; contents are lost on restart.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<HashMap<String, TaskRecord>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for MemoryTaskStore {
    fn create(&self, id: &str, record: TaskRecord) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock();
        if tasks.contains_key(id) {
            return Err(StoreError::Duplicate(id.to_string()));
        }
        tasks.insert(id.to_string(), record);
        Ok(())
    }

    fn update(&self, id: &str, patch: TaskPatch) -> Result<(), StoreError> {
        let mut tasks = self.tasks.lock();
        let record = tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if record.status.is_terminal() {
            return Err(StoreError::Finalized(id.to_string(), record.status));
        }
        if let Some(next) = patch.status {
            if !record.status.can_become(next) {
                return Err(StoreError::InvalidTransition {
                    id: id.to_string(),
                    from: record.status,
                    to: next,
                });
            }
            record.status = next;
        }
        if let Some(research) = patch.research {
            record.research = Some(research);
        }
        if let Some(path) = patch.markdown_path {
            record.markdown_path = Some(path);
        }
        if let Some(deployment) = patch.deployment {
            record.deployment = Some(deployment);
        }
        if let Some(error) = patch.error {
            record.error = Some(error);
        }
        Ok(())
    }

    fn get(&self, id: &str) -> Option<TaskRecord> {
        self.tasks.lock().get(id).cloned()
    }

    fn len(&self) -> usize {
        self.tasks.lock().len()
    }
}
