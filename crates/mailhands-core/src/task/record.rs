//! Task records and status.

use chrono::{DateTime, Utc};
use mailhands_protocols::EmailIntent;
use serde::Serialize;

use crate::coordinator::ProviderResults;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    PartiallySucceeded,
}

impl TaskStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::PartiallySucceeded
        )
    }

    /// all succeeded → `Succeeded`, none → `Failed`, otherwise `PartiallySucceeded`.
    pub fn from_results(results: &ProviderResults) -> Self {
        let succeeded = results.values().filter(|o| o.success).count();
        match succeeded {
            0 => TaskStatus::Failed,
            n if n == results.len() => TaskStatus::Succeeded,
            _ => TaskStatus::PartiallySucceeded,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
            TaskStatus::PartiallySucceeded => "partially_succeeded",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted send request.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub id: String,
    pub status: TaskStatus,
    pub intent: EmailIntent,
    pub providers: Vec<String>,
    pub headless: bool,
    pub per_provider_result: ProviderResults,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    pub fn new(intent: EmailIntent, providers: Vec<String>, headless: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: TaskStatus::Pending,
            intent,
            providers,
            headless,
            per_provider_result: ProviderResults::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// `Pending → Running`. Returns false if the task already left `Pending`.
    pub fn start(&mut self) -> bool {
        if self.status != TaskStatus::Pending {
            return false;
        }
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
        true
    }

    /// Record the aggregate outcome. A terminal record is never rewritten.
    pub fn complete(&mut self, results: ProviderResults) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TaskStatus::from_results(&results);
        self.per_provider_result = results;
        self.completed_at = Some(Utc::now());
        true
    }
}
