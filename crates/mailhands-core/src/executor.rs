//! Action executor.
//!
//! Runs a provider's fixed workflow against one session. Any failing step
//! aborts the rest of the sequence; send is only reached after every earlier
//! step succeeded and the filled fields read back the intent's values.

use std::time::Duration;

use mailhands_config::EngineConfig;
use mailhands_protocols::{
    DriverError, ElementHandle, EmailIntent, EngineError, Field, PageDriver,
};
use serde::Serialize;
use tokio::time::{Instant, sleep};
use tracing::{Instrument, debug, error, info, warn};

use crate::context::ExecutionContext;
use crate::diagnostics::FailureContext;
use crate::providers::ProviderSpec;
use crate::resolve::{WaitPolicy, resolve};
use crate::session::Session;
use crate::step::{ActionStep, StepKind};

/// Executor tuning.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub wait: WaitPolicy,
    /// Bound on the manual login window.
    pub auth_timeout: Duration,
    pub auth_poll_interval: Duration,
    /// Pause after opening the compose form.
    pub settle: Duration,
    /// Resolve and verify the send control, but never click it.
    pub dry_run: bool,
    pub capture_snapshots: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            wait: WaitPolicy::default(),
            auth_timeout: Duration::from_secs(60),
            auth_poll_interval: Duration::from_secs(1),
            settle: Duration::from_millis(500),
            dry_run: false,
            capture_snapshots: true,
        }
    }
}

impl From<&EngineConfig> for ExecutorConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            wait: WaitPolicy {
                timeout: config.locator_timeout(),
                poll_interval: config.poll_interval(),
            },
            auth_timeout: config.auth_timeout(),
            settle: config.settle(),
            dry_run: config.dry_run,
            capture_snapshots: config.capture_snapshots,
            ..Default::default()
        }
    }
}

/// A completed workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub provider: String,
    pub steps_completed: usize,
    /// The send control was resolved but not clicked.
    pub dry_run: bool,
}

/// A workflow that stopped early.
#[derive(Debug, Clone)]
pub struct ExecutionFailure {
    pub error: EngineError,
    pub context: FailureContext,
}

pub type ExecutionResult = Result<ExecutionReport, ExecutionFailure>;

#[derive(Debug, Clone, Copy)]
enum Interaction<'a> {
    Click,
    Fill(&'a str),
}

impl Interaction<'_> {
    fn describe(&self, field: Field) -> String {
        match self {
            Interaction::Click => format!("click {}", field),
            Interaction::Fill(_) => format!("type {}", field),
        }
    }
}

/// Progress of one execution.
struct Run<'a> {
    spec: &'a ProviderSpec,
    intent: &'a EmailIntent,
    current: Option<ActionStep>,
    completed: usize,
    filled: Vec<(Field, ElementHandle)>,
    dry_run: bool,
}

/// Drives any provider through its workflow.
#[derive(Debug, Clone, Default)]
pub struct ActionExecutor {
    config: ExecutorConfig,
}

impl ActionExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run `spec`'s workflow for `intent` on a ready session.
    pub async fn execute(
        &self,
        session: &mut Session,
        spec: &ProviderSpec,
        intent: &EmailIntent,
        ctx: &ExecutionContext,
    ) -> ExecutionResult {
        let span = ctx.span().clone();
        async move {
            let page = match session.begin().and_then(|_| session.page()) {
                Ok(page) => page,
                Err(error) => {
                    return Err(ExecutionFailure {
                        error,
                        context: FailureContext {
                            step: "begin".to_string(),
                            ..Default::default()
                        },
                    });
                }
            };

            info!("Starting {} workflow", spec.display_name());
            let mut run = Run {
                spec,
                intent,
                current: None,
                completed: 0,
                filled: Vec::new(),
                dry_run: false,
            };

            match self.run_steps(page, &mut run).await {
                Ok(()) => {
                    info!(
                        "{} workflow finished ({} steps{})",
                        spec.display_name(),
                        run.completed,
                        if run.dry_run { ", dry run" } else { "" }
                    );
                    Ok(ExecutionReport {
                        provider: spec.name().to_string(),
                        steps_completed: run.completed,
                        dry_run: run.dry_run,
                    })
                }
                Err(err) => {
                    let context = self.capture_failure(page, &run, &err, ctx).await;
                    error!("{} failed at {}: {}", spec.display_name(), context.step, err);
                    Err(ExecutionFailure {
                        error: err,
                        context,
                    })
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_steps(
        &self,
        page: &mut dyn PageDriver,
        run: &mut Run<'_>,
    ) -> Result<(), EngineError> {
        let spec = run.spec;

        for step in spec.workflow() {
            run.current = Some(*step);
            debug!(step = %step, "Running step");

            match step.kind {
                StepKind::Navigate => self.navigate(page, spec).await?,
                StepKind::Wait => self.await_authentication(page, spec).await?,
                StepKind::Click if step.is_send() => {
                    self.verify_fields(page, run).await?;
                    if self.config.dry_run {
                        let set = spec.locators(Field::Send)?;
                        resolve(page, spec.name(), Field::Send, set, self.config.wait).await?;
                        info!("Dry run: send control found, not clicking");
                        run.dry_run = true;
                    } else {
                        self.perform(page, spec, Field::Send, Interaction::Click)
                            .await?;
                    }
                }
                StepKind::Click => {
                    let field = Self::step_field(step, spec)?;
                    self.perform(page, spec, field, Interaction::Click).await?;
                    if field == Field::Compose && !self.config.settle.is_zero() {
                        sleep(self.config.settle).await;
                    }
                }
                StepKind::TypeText => {
                    let field = Self::step_field(step, spec)?;
                    let value = step.value(run.intent).unwrap_or_default();
                    let element = self
                        .perform(page, spec, field, Interaction::Fill(value))
                        .await?;
                    run.filled.push((field, element));
                }
            }

            run.completed += 1;
        }

        Ok(())
    }

    fn step_field(step: &ActionStep, spec: &ProviderSpec) -> Result<Field, EngineError> {
        step.field.ok_or_else(|| {
            EngineError::SessionCrashed(format!(
                "{} workflow step {} names no field",
                spec.name(),
                step
            ))
        })
    }

    async fn navigate(
        &self,
        page: &mut dyn PageDriver,
        spec: &ProviderSpec,
    ) -> Result<(), EngineError> {
        info!("Navigating to {}", spec.base_url());
        page.navigate(spec.base_url()).await.map_err(|e| {
            if e.is_fatal() {
                EngineError::SessionCrashed(format!("{}: {}", spec.name(), e))
            } else {
                EngineError::NavigationError {
                    provider: spec.name().to_string(),
                    url: spec.base_url().to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        self.check_blocked(page, spec).await
    }

    async fn check_blocked(
        &self,
        page: &mut dyn PageDriver,
        spec: &ProviderSpec,
    ) -> Result<(), EngineError> {
        let source = page
            .page_source()
            .await
            .map_err(|e| map_driver_error(spec, "read page source", e))?;
        match spec.blocked_marker(&source) {
            Some(marker) => Err(EngineError::ProviderBlocked {
                provider: spec.name().to_string(),
                marker: marker.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Bounded wait for an operator to finish logging in.
    async fn await_authentication(
        &self,
        page: &mut dyn PageDriver,
        spec: &ProviderSpec,
    ) -> Result<(), EngineError> {
        let url = page
            .current_url()
            .await
            .map_err(|e| map_driver_error(spec, "read current url", e))?;
        if spec.is_authenticated(&url) {
            return Ok(());
        }

        let timeout = self.config.auth_timeout;
        warn!(
            "{} requires authentication (at {}); waiting up to {}s for manual login",
            spec.display_name(),
            url,
            timeout.as_secs()
        );
        let deadline = Instant::now() + timeout;

        loop {
            self.check_blocked(page, spec).await?;

            let now = Instant::now();
            if now >= deadline {
                return Err(EngineError::AuthenticationTimeout {
                    provider: spec.name().to_string(),
                    waited_secs: timeout.as_secs(),
                });
            }
            sleep(self.config.auth_poll_interval.min(deadline - now)).await;

            let url = page
                .current_url()
                .await
                .map_err(|e| map_driver_error(spec, "read current url", e))?;
            if spec.is_authenticated(&url) {
                info!("{} login completed", spec.display_name());
                return Ok(());
            }
        }
    }

    /// Resolve `field` and act on it, re-resolving once if the element went stale.
    async fn perform(
        &self,
        page: &mut dyn PageDriver,
        spec: &ProviderSpec,
        field: Field,
        action: Interaction<'_>,
    ) -> Result<ElementHandle, EngineError> {
        let set = spec.locators(field)?;
        let element = resolve(page, spec.name(), field, set, self.config.wait).await?;

        match apply(page, &element, action).await {
            Ok(()) => Ok(element),
            Err(DriverError::StaleElement(_)) => {
                debug!("{}/{} went stale, resolving again", spec.name(), field);
                let element = resolve(page, spec.name(), field, set, self.config.wait).await?;
                match apply(page, &element, action).await {
                    Ok(()) => Ok(element),
                    Err(DriverError::StaleElement(_)) => Err(EngineError::ElementNotFound {
                        provider: spec.name().to_string(),
                        field,
                        tried: set.as_slice().to_vec(),
                    }),
                    Err(e) => Err(map_driver_error(spec, &action.describe(field), e)),
                }
            }
            Err(e) => Err(map_driver_error(spec, &action.describe(field), e)),
        }
    }

    /// Read back every filled field before the irreversible send.
    ///
    /// Address inputs may turn the typed text into a chip and empty
    /// themselves, so a recipient missing from its input is looked up in the
    /// provider's recipient container instead.
    async fn verify_fields(
        &self,
        page: &mut dyn PageDriver,
        run: &Run<'_>,
    ) -> Result<(), EngineError> {
        let spec = run.spec;
        for (field, element) in &run.filled {
            let expected = field.intent_value(run.intent).unwrap_or_default();
            let mut actual = match page.read_value(element).await {
                Ok(value) => value,
                Err(DriverError::StaleElement(_)) if *field == Field::Recipient => String::new(),
                Err(e) => {
                    return Err(map_driver_error(spec, &format!("read back {}", field), e));
                }
            };

            if !holds(&actual, expected) && *field == Field::Recipient {
                if let Some(shown) = self.read_recipients(page, spec).await? {
                    actual = shown;
                }
            }

            if !holds(&actual, expected) {
                return Err(EngineError::FieldMismatch {
                    provider: spec.name().to_string(),
                    field: *field,
                    expected: expected.to_string(),
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Text of the accepted-recipients container, if the provider has one
    /// and it can be found.
    async fn read_recipients(
        &self,
        page: &mut dyn PageDriver,
        spec: &ProviderSpec,
    ) -> Result<Option<String>, EngineError> {
        let Some(set) = spec.recipient_readback() else {
            return Ok(None);
        };
        let found = resolve(page, spec.name(), Field::Recipient, set, self.config.wait).await;
        let container = match found {
            Ok(container) => container,
            Err(EngineError::ElementNotFound { .. }) => {
                debug!("{}: no recipient container found", spec.name());
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        page.read_value(&container)
            .await
            .map(Some)
            .map_err(|e| map_driver_error(spec, "read back recipients", e))
    }

    async fn capture_failure(
        &self,
        page: &mut dyn PageDriver,
        run: &Run<'_>,
        err: &EngineError,
        ctx: &ExecutionContext,
    ) -> FailureContext {
        let step = run
            .current
            .map(|s| s.to_string())
            .unwrap_or_else(|| "begin".to_string());

        // A dead driver has nothing left to report.
        if matches!(err, EngineError::SessionCrashed(_)) {
            return FailureContext {
                step,
                ..Default::default()
            };
        }

        let url = page.current_url().await.ok();
        let snapshot = if self.config.capture_snapshots {
            ctx.diagnostics()
                .capture(page, run.spec.name(), &step)
                .await
        } else {
            None
        };

        FailureContext {
            step,
            url,
            snapshot,
        }
    }
}

async fn apply(
    page: &mut dyn PageDriver,
    element: &ElementHandle,
    action: Interaction<'_>,
) -> Result<(), DriverError> {
    match action {
        Interaction::Click => page.click(element).await,
        Interaction::Fill(text) => page.fill(element, text).await,
    }
}

/// Fatal errors mean the browser is gone; anything else failed `action` on a
/// live page.
fn map_driver_error(spec: &ProviderSpec, action: &str, e: DriverError) -> EngineError {
    if e.is_fatal() {
        EngineError::SessionCrashed(format!("{}: {}", spec.name(), e))
    } else {
        EngineError::ActionFailed {
            provider: spec.name().to_string(),
            action: action.to_string(),
            reason: e.to_string(),
        }
    }
}

/// Whitespace-insensitive containment.
fn holds(actual: &str, expected: &str) -> bool {
    normalize(actual).contains(&normalize(expected))
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
