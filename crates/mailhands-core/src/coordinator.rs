//! Provider fan-out.
//!
//! Each requested provider runs in its own session and behind its own error
//! boundary; a failing or crashing provider never stops its siblings.

use std::collections::BTreeMap;
use std::sync::Arc;

use mailhands_protocols::{EmailIntent, EngineError, ErrorKind, SessionLauncher, SessionOptions};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, error, info, warn};

use crate::analysis::{DomAnalysis, analyze_page};
use crate::context::ExecutionContext;
use crate::diagnostics::FailureContext;
use crate::executor::{ActionExecutor, ExecutionFailure, ExecutionReport, ExecutorConfig};
use crate::providers::{ProviderCatalog, ProviderSpec};
use crate::session::{Session, SessionManager};

/// Result of one provider's run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureContext>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
}

impl ProviderOutcome {
    pub fn succeeded(report: &ExecutionReport) -> Self {
        Self {
            success: true,
            error_kind: None,
            error: None,
            failure: None,
            dry_run: report.dry_run,
        }
    }

    pub fn failed(error: &EngineError, failure: Option<FailureContext>) -> Self {
        Self {
            success: false,
            error_kind: Some(error.kind()),
            error: Some(error.to_string()),
            failure,
            dry_run: false,
        }
    }
}

impl From<ExecutionFailure> for ProviderOutcome {
    fn from(failure: ExecutionFailure) -> Self {
        Self::failed(&failure.error, Some(failure.context))
    }
}

/// Provider name → outcome, in name order.
pub type ProviderResults = BTreeMap<String, ProviderOutcome>;

/// Runs the action executor once per requested provider.
#[derive(Clone)]
pub struct ProviderCoordinator {
    catalog: Arc<ProviderCatalog>,
    launcher: Arc<dyn SessionLauncher>,
    executor: ActionExecutor,
}

impl ProviderCoordinator {
    pub fn new(
        catalog: Arc<ProviderCatalog>,
        launcher: Arc<dyn SessionLauncher>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            catalog,
            launcher,
            executor: ActionExecutor::new(config),
        }
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    pub fn launcher(&self) -> &Arc<dyn SessionLauncher> {
        &self.launcher
    }

    /// Validate provider names without touching the browser.
    pub fn resolve_providers<S: AsRef<str>>(
        &self,
        providers: &[S],
    ) -> Result<Vec<Arc<ProviderSpec>>, EngineError> {
        self.catalog.resolve_all(providers)
    }

    /// Send `intent` through every provider in `providers`.
    ///
    /// Unknown names fail the whole call before any session is opened.
    pub async fn run<S: AsRef<str>>(
        &self,
        intent: &EmailIntent,
        providers: &[S],
        options: &SessionOptions,
        ctx: &ExecutionContext,
    ) -> Result<ProviderResults, EngineError> {
        let specs = self.resolve_providers(providers)?;
        Ok(self.run_resolved(intent, &specs, options, ctx).await)
    }

    /// Run already-validated providers sequentially.
    pub async fn run_resolved(
        &self,
        intent: &EmailIntent,
        specs: &[Arc<ProviderSpec>],
        options: &SessionOptions,
        ctx: &ExecutionContext,
    ) -> ProviderResults {
        let manager = SessionManager::new(self.launcher.clone(), options.clone());
        let mut results = ProviderResults::new();

        for spec in specs {
            let outcome = self.run_isolated(&manager, spec.clone(), intent, ctx).await;
            if outcome.success {
                info!("{}: sent", spec.name());
            } else {
                warn!(
                    "{}: failed ({})",
                    spec.name(),
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.insert(spec.name().to_string(), outcome);
        }

        results
    }

    /// Run one provider on its own tokio task so even a panic stays contained.
    async fn run_isolated(
        &self,
        manager: &SessionManager,
        spec: Arc<ProviderSpec>,
        intent: &EmailIntent,
        ctx: &ExecutionContext,
    ) -> ProviderOutcome {
        let manager = manager.clone();
        let executor = self.executor.clone();
        let intent = intent.clone();
        let ctx = ctx.for_provider(spec.name());
        let name = spec.name().to_string();
        let span = ctx.span().clone();

        let handle = tokio::spawn(
            async move { run_provider(&manager, &executor, &spec, &intent, &ctx).await }
                .instrument(span),
        );

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("{} execution aborted: {}", name, e);
                ProviderOutcome::failed(
                    &EngineError::SessionCrashed(format!("{} execution aborted: {}", name, e)),
                    None,
                )
            }
        }
    }

    /// Open `provider`, wait for it to load, and sample its DOM.
    pub async fn analyze(
        &self,
        provider: &str,
        options: &SessionOptions,
    ) -> Result<DomAnalysis, EngineError> {
        let spec = self.catalog.get(provider)?;
        let manager = SessionManager::new(self.launcher.clone(), options.clone());
        let mut session = manager.acquire(spec.name()).await?;

        let result = match session.begin().and_then(|_| session.page()) {
            Ok(page) => analyze_page(page, &spec, self.executor.config().settle).await,
            Err(e) => Err(e),
        };
        finish_session(&mut session, result.as_ref().err()).await;
        result
    }
}

async fn run_provider(
    manager: &SessionManager,
    executor: &ActionExecutor,
    spec: &ProviderSpec,
    intent: &EmailIntent,
    ctx: &ExecutionContext,
) -> ProviderOutcome {
    let mut session = match manager.acquire(spec.name()).await {
        Ok(session) => session,
        Err(e) => return ProviderOutcome::failed(&e, None),
    };

    let result = executor.execute(&mut session, spec, intent, ctx).await;
    finish_session(&mut session, result.as_ref().err().map(|f| &f.error)).await;

    match result {
        Ok(report) => ProviderOutcome::succeeded(&report),
        Err(failure) => failure.into(),
    }
}

/// Close the session, or mark it failed if the driver died.
async fn finish_session(session: &mut Session, error: Option<&EngineError>) {
    match error {
        Some(EngineError::SessionCrashed(reason)) => session.fail(reason).await,
        _ => {
            if let Err(e) = session.close().await {
                warn!("Session {} did not close cleanly: {}", session.id(), e);
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
