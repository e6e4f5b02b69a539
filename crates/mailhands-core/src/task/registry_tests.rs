use std::time::Duration;

use super::*;
use crate::diagnostics::NoopDiagnostics;
use crate::executor::ExecutorConfig;
use crate::providers::ProviderCatalog;
use crate::testing::{FakeDom, FakeLauncher};
use mailhands_protocols::ErrorKind;

fn intent() -> EmailIntent {
    EmailIntent::new(
        "alice@example.com",
        "quarterly report",
        "Please review the attached document",
        "raw",
    )
    .unwrap()
}

fn registry(launcher: Arc<FakeLauncher>) -> TaskRegistry {
    let coordinator = ProviderCoordinator::new(
        Arc::new(ProviderCatalog::builtin()),
        launcher,
        ExecutorConfig::default(),
    );
    TaskRegistry::new(Arc::new(coordinator), Arc::new(NoopDiagnostics))
}

fn dom_for(name: &str) -> FakeDom {
    FakeDom::for_provider(&ProviderCatalog::builtin().get(name).unwrap())
}

async fn wait_terminal(registry: &TaskRegistry, id: &str) -> TaskRecord {
    loop {
        let record = registry.status(id).unwrap();
        if record.status.is_terminal() {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_submit_runs_to_success() {
    let launcher = Arc::new(FakeLauncher::new([dom_for("gmail")]));
    let registry = registry(launcher.clone());

    let id = registry
        .submit(intent(), vec!["gmail".into()], SessionOptions::default())
        .unwrap();
    let record = registry.status(&id).unwrap();
    assert_eq!(record.status, TaskStatus::Pending);

    let record = wait_terminal(&registry, &id).await;
    assert_eq!(record.status, TaskStatus::Succeeded);
    assert!(record.per_provider_result["gmail"].success);
    assert!(record.started_at.is_some());
    assert!(record.completed_at.unwrap() >= record.created_at);
    assert_eq!(launcher.opens(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_submit_returns_before_execution_finishes() {
    let dom = dom_for("gmail");
    dom.delay_navigation(Duration::from_secs(30));
    let launcher = Arc::new(FakeLauncher::new([dom]));
    let registry = registry(launcher);

    let started = tokio::time::Instant::now();
    let id = registry
        .submit(intent(), vec!["gmail".into()], SessionOptions::default())
        .unwrap();
    assert_eq!(started.elapsed(), Duration::ZERO);

    // Let the worker pick the task up, but not finish it.
    tokio::time::sleep(Duration::from_secs(1)).await;
    let record = registry.status(&id).unwrap();
    assert!(matches!(record.status, TaskStatus::Pending | TaskStatus::Running));
    assert_eq!(registry.active(), 1);

    let record = wait_terminal(&registry, &id).await;
    assert_eq!(record.status, TaskStatus::Succeeded);
    assert!(started.elapsed() >= Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_partial_success_isolates_providers() {
    let gmail = dom_for("gmail");
    // Driver dies after navigation.
    gmail.crash_after(3);
    let outlook = dom_for("outlook");
    let launcher = Arc::new(FakeLauncher::new([gmail.clone(), outlook.clone()]));
    let registry = registry(launcher.clone());

    let id = registry
        .submit(
            intent(),
            vec!["gmail".into(), "outlook".into()],
            SessionOptions::default(),
        )
        .unwrap();
    let record = wait_terminal(&registry, &id).await;

    assert_eq!(record.status, TaskStatus::PartiallySucceeded);
    let gmail_result = &record.per_provider_result["gmail"];
    assert!(!gmail_result.success);
    assert_eq!(gmail_result.error_kind, Some(ErrorKind::SessionCrashed));
    assert!(gmail_result.error.is_some());
    assert!(record.per_provider_result["outlook"].success);
    assert_eq!(launcher.opens(), 2);
    assert!(outlook.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_all_providers_fail() {
    let gmail = dom_for("gmail");
    gmail.set_landing_url("https://accounts.google.com/signin");
    let launcher = Arc::new(FakeLauncher::new([gmail]));
    let registry = registry(launcher);

    let id = registry
        .submit(intent(), vec!["gmail".into()], SessionOptions::default())
        .unwrap();
    let record = wait_terminal(&registry, &id).await;
    assert_eq!(record.status, TaskStatus::Failed);
    assert_eq!(
        record.per_provider_result["gmail"].error_kind,
        Some(ErrorKind::AuthenticationTimeout)
    );
}

#[tokio::test]
async fn test_unknown_provider_fails_before_any_session() {
    let launcher = Arc::new(FakeLauncher::new([dom_for("gmail")]));
    let registry = registry(launcher.clone());

    let err = registry
        .submit(intent(), vec!["yahoo".into()], SessionOptions::default())
        .unwrap_err();
    assert!(matches!(err, EngineError::UnsupportedProvider(ref n) if n == "yahoo"));
    assert!(registry.is_empty());

    tokio::task::yield_now().await;
    assert_eq!(launcher.opens(), 0);
}

#[tokio::test]
async fn test_empty_provider_list_rejected() {
    let registry = registry(Arc::new(FakeLauncher::default()));
    let err = registry
        .submit(intent(), Vec::new(), SessionOptions::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedProvider);
}

#[tokio::test]
async fn test_status_unknown_id() {
    let registry = registry(Arc::new(FakeLauncher::default()));
    let err = registry.status("missing").unwrap_err();
    assert!(matches!(err, EngineError::TaskNotFound(ref id) if id == "missing"));
}

#[tokio::test(start_paused = true)]
async fn test_list_and_evict() {
    let slow = dom_for("outlook");
    slow.delay_navigation(Duration::from_secs(3600));
    let launcher = Arc::new(FakeLauncher::new([dom_for("gmail"), slow]));
    let registry = registry(launcher);

    let done = registry
        .submit(intent(), vec!["gmail".into()], SessionOptions::default())
        .unwrap();
    wait_terminal(&registry, &done).await;
    let running = registry
        .submit(intent(), vec!["outlook".into()], SessionOptions::default())
        .unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let ids: Vec<_> = registry.list().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![done.clone(), running.clone()]);

    assert_eq!(registry.evict_terminal(), 1);
    assert!(registry.status(&done).is_err());
    assert!(registry.status(&running).is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_headless_option_reaches_launcher() {
    let launcher = Arc::new(FakeLauncher::new([dom_for("gmail")]));
    let registry = registry(launcher.clone());
    let id = registry
        .submit(intent(), vec!["Gmail".into()], SessionOptions::headless(true))
        .unwrap();
    let record = wait_terminal(&registry, &id).await;
    assert!(record.headless);
    assert_eq!(record.providers, vec!["gmail".to_string()]);
    assert_eq!(launcher.last_options(), Some(SessionOptions::headless(true)));
}
