//! # MailHands Core
//!
//! Provider-agnostic action engine for sending email through web mail
//! clients.
//!
//! ## Components
//!
//! - [`ProviderCatalog`] / [`ProviderSpec`] - locator tables and workflows
//! - [`resolve`](resolve::resolve) - ordered fallback locator resolution
//! - [`ActionExecutor`] - runs one provider's workflow on one session
//! - [`SessionManager`] - opens and tears down browser sessions
//! - [`ProviderCoordinator`] - fans an intent out to several providers
//! - [`TaskRegistry`] - asynchronous task tracking

pub mod analysis;
pub mod context;
pub mod coordinator;
pub mod diagnostics;
pub mod executor;
pub mod intent;
pub mod providers;
pub mod resolve;
pub mod session;
pub mod step;
pub mod task;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use analysis::DomAnalysis;
pub use context::ExecutionContext;
pub use coordinator::{ProviderCoordinator, ProviderOutcome, ProviderResults};
pub use diagnostics::{DiagnosticsSink, FailureContext, FileDiagnostics, NoopDiagnostics};
pub use executor::{ActionExecutor, ExecutionFailure, ExecutionReport, ExecutorConfig};
pub use intent::PatternIntentParser;
pub use providers::{ProviderCatalog, ProviderSpec, ProviderSummary};
pub use resolve::WaitPolicy;
pub use session::{Session, SessionManager, SessionState};
pub use step::{ActionStep, COMPOSE_WORKFLOW, StepKind};
pub use task::{TaskRecord, TaskRegistry, TaskStatus};
