//! Execution context threaded through the engine.

use std::sync::Arc;

use tracing::{Span, info_span};

use crate::diagnostics::{DiagnosticsSink, NoopDiagnostics};

/// Logging span and diagnostics sink for one execution.
///
/// Passed explicitly to the executor and coordinator instead of reaching for
/// process-wide state.
#[derive(Clone)]
pub struct ExecutionContext {
    task_id: String,
    span: Span,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl ExecutionContext {
    pub fn new(task_id: impl Into<String>, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        let task_id = task_id.into();
        let span = info_span!("task", task_id = %task_id);
        Self {
            task_id,
            span,
            diagnostics,
        }
    }

    /// Context without snapshots.
    pub fn detached(task_id: impl Into<String>) -> Self {
        Self::new(task_id, Arc::new(NoopDiagnostics))
    }

    /// Child context scoped to one provider.
    pub fn for_provider(&self, provider: &str) -> Self {
        Self {
            task_id: self.task_id.clone(),
            span: info_span!(parent: &self.span, "provider", provider = %provider),
            diagnostics: self.diagnostics.clone(),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn diagnostics(&self) -> &dyn DiagnosticsSink {
        self.diagnostics.as_ref()
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("task_id", &self.task_id)
            .finish_non_exhaustive()
    }
}
