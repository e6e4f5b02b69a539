//! Process-wide task registry.

use std::sync::Arc;

use dashmap::DashMap;
use mailhands_protocols::{EmailIntent, EngineError, SessionOptions};
use tracing::{Instrument, debug, info};

use super::record::{TaskRecord, TaskStatus};
use crate::context::ExecutionContext;
use crate::coordinator::ProviderCoordinator;
use crate::diagnostics::DiagnosticsSink;

/// Maps task ids to records and schedules their execution.
///
/// The map is shared between task workers and readers; each record is only
/// written by the worker that owns it.
pub struct TaskRegistry {
    tasks: Arc<DashMap<String, TaskRecord>>,
    coordinator: Arc<ProviderCoordinator>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl TaskRegistry {
    pub fn new(coordinator: Arc<ProviderCoordinator>, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            tasks: Arc::new(DashMap::new()),
            coordinator,
            diagnostics,
        }
    }

    pub fn coordinator(&self) -> &Arc<ProviderCoordinator> {
        &self.coordinator
    }

    /// Register a task and start it in the background.
    ///
    /// Provider names are validated first; an unknown or empty list fails
    /// here, before any record or session exists. Must be called from
    /// within a tokio runtime.
    pub fn submit(
        &self,
        intent: EmailIntent,
        providers: Vec<String>,
        options: SessionOptions,
    ) -> Result<String, EngineError> {
        let specs = self.coordinator.resolve_providers(&providers)?;

        let names = specs.iter().map(|s| s.name().to_string()).collect();
        let record = TaskRecord::new(intent.clone(), names, options.headless);
        let task_id = record.id.clone();
        self.tasks.insert(task_id.clone(), record);
        info!("Task {} submitted for {:?}", task_id, providers);

        let tasks = self.tasks.clone();
        let coordinator = self.coordinator.clone();
        let ctx = ExecutionContext::new(task_id.clone(), self.diagnostics.clone());
        let span = ctx.span().clone();
        let id = task_id.clone();

        tokio::spawn(
            async move {
                if let Some(mut record) = tasks.get_mut(&id) {
                    record.start();
                }

                let results = coordinator
                    .run_resolved(&intent, &specs, &options, &ctx)
                    .await;

                if let Some(mut record) = tasks.get_mut(&id) {
                    record.complete(results);
                    info!("Task {} finished: {}", id, record.status);
                } else {
                    debug!("Task {} was evicted before completion", id);
                }
            }
            .instrument(span),
        );

        Ok(task_id)
    }

    /// Current record for `task_id`.
    pub fn status(&self, task_id: &str) -> Result<TaskRecord, EngineError> {
        self.tasks
            .get(task_id)
            .map(|r| r.clone())
            .ok_or_else(|| EngineError::TaskNotFound(task_id.to_string()))
    }

    /// All records, oldest first.
    pub fn list(&self) -> Vec<TaskRecord> {
        let mut records: Vec<TaskRecord> = self.tasks.iter().map(|r| r.clone()).collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        records
    }

    /// Drop every terminal record. Running and pending tasks are kept.
    pub fn evict_terminal(&self) -> usize {
        let mut evicted = 0;
        self.tasks.retain(|_, r| {
            let keep = !r.status.is_terminal();
            if !keep {
                evicted += 1;
            }
            keep
        });
        debug!("Evicted {} finished tasks", evicted);
        evicted
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of pending or running tasks.
    pub fn active(&self) -> usize {
        self.tasks
            .iter()
            .filter(|r| matches!(r.status, TaskStatus::Pending | TaskStatus::Running))
            .count()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
