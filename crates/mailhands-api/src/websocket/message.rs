//! WebSocket message types.

use chrono::{DateTime, Utc};
use mailhands_core::{TaskRecord, TaskRegistry};
use serde::Serialize;

/// Pushed to task subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskUpdate {
    Status {
        task: TaskRecord,
        timestamp: DateTime<Utc>,
    },
    Error {
        task_id: String,
        error: String,
    },
}

impl TaskUpdate {
    /// Current state of `task_id`.
    pub fn snapshot(registry: &TaskRegistry, task_id: &str) -> Self {
        match registry.status(task_id) {
            Ok(task) => TaskUpdate::Status {
                task,
                timestamp: Utc::now(),
            },
            Err(e) => TaskUpdate::Error {
                task_id: task_id.to_string(),
                error: e.to_string(),
            },
        }
    }

    /// No further updates will follow.
    pub fn is_final(&self) -> bool {
        match self {
            TaskUpdate::Status { task, .. } => task.status.is_terminal(),
            TaskUpdate::Error { .. } => true,
        }
    }
}
