use super::*;
use crate::testing::{FakeDom, FakeLauncher};
use mailhands_protocols::{DriverError, Field};

fn intent() -> EmailIntent {
    EmailIntent::new(
        "alice@example.com",
        "quarterly report",
        "Please review the attached document",
        "raw",
    )
    .unwrap()
}

fn coordinator(launcher: Arc<FakeLauncher>) -> ProviderCoordinator {
    ProviderCoordinator::new(
        Arc::new(ProviderCatalog::builtin()),
        launcher,
        ExecutorConfig::default(),
    )
}

fn dom_for(name: &str) -> FakeDom {
    FakeDom::for_provider(&ProviderCatalog::builtin().get(name).unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_single_provider_success() {
    let launcher = Arc::new(FakeLauncher::new([dom_for("gmail")]));
    let results = coordinator(launcher)
        .run(
            &intent(),
            &["gmail"],
            &SessionOptions::default(),
            &ExecutionContext::detached("t"),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    let gmail = &results["gmail"];
    assert!(gmail.success);
    assert!(gmail.error_kind.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failure_does_not_stop_siblings() {
    let gmail = dom_for("gmail");
    let spec = ProviderCatalog::builtin().get("gmail").unwrap();
    gmail.remove(&spec.locators(Field::Compose).unwrap().as_slice()[0]);
    let outlook = dom_for("outlook");
    let launcher = Arc::new(FakeLauncher::new([gmail.clone(), outlook.clone()]));

    let results = coordinator(launcher)
        .run(
            &intent(),
            &["gmail", "outlook"],
            &SessionOptions::default(),
            &ExecutionContext::detached("t"),
        )
        .await
        .unwrap();

    let gmail_result = &results["gmail"];
    assert!(!gmail_result.success);
    assert_eq!(gmail_result.error_kind, Some(ErrorKind::ElementNotFound));
    assert_eq!(gmail_result.failure.as_ref().unwrap().step, "click_compose");
    assert!(results["outlook"].success);

    // Sessions never overlap: gmail's page is closed before outlook's runs.
    assert!(gmail.is_closed());
    assert!(outlook.is_closed());
}

#[tokio::test]
async fn test_unknown_provider_fails_fast() {
    let launcher = Arc::new(FakeLauncher::new([dom_for("gmail")]));
    let err = coordinator(launcher.clone())
        .run(
            &intent(),
            &["gmail", "yahoo"],
            &SessionOptions::default(),
            &ExecutionContext::detached("t"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::UnsupportedProvider(ref n) if n == "yahoo"));
    assert_eq!(launcher.opens(), 0);
}

#[tokio::test]
async fn test_launch_failure_is_reported_per_provider() {
    let launcher = Arc::new(FakeLauncher::failing(DriverError::Launch(
        "chrome not found".into(),
    )));
    let results = coordinator(launcher)
        .run(
            &intent(),
            &["gmail", "outlook"],
            &SessionOptions::default(),
            &ExecutionContext::detached("t"),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    for outcome in results.values() {
        assert!(!outcome.success);
        assert_eq!(outcome.error_kind, Some(ErrorKind::SessionCrashed));
        assert!(outcome.failure.is_none());
    }
}

#[tokio::test(start_paused = true)]
async fn test_crashed_session_is_marked_failed() {
    let gmail = dom_for("gmail");
    gmail.crash_after(1);
    let launcher = Arc::new(FakeLauncher::new([gmail.clone()]));

    let results = coordinator(launcher)
        .run(
            &intent(),
            &["gmail"],
            &SessionOptions::default(),
            &ExecutionContext::detached("t"),
        )
        .await
        .unwrap();
    assert_eq!(results["gmail"].error_kind, Some(ErrorKind::SessionCrashed));
    // The failed session still releases its page.
    assert!(gmail.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_rejected_click_is_not_a_crash() {
    let gmail = dom_for("gmail");
    let spec = ProviderCatalog::builtin().get("gmail").unwrap();
    gmail.fail_action(
        &spec.locators(Field::Send).unwrap().as_slice()[0],
        DriverError::Script("Node is not clickable".into()),
    );
    let launcher = Arc::new(FakeLauncher::new([gmail.clone()]));

    let results = coordinator(launcher)
        .run(
            &intent(),
            &["gmail"],
            &SessionOptions::default(),
            &ExecutionContext::detached("t"),
        )
        .await
        .unwrap();
    let outcome = &results["gmail"];
    assert_eq!(outcome.error_kind, Some(ErrorKind::ActionFailed));
    let failure = outcome.failure.as_ref().unwrap();
    assert_eq!(failure.step, "click_send");
    assert!(failure.url.is_some());
    assert!(gmail.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_dry_run_outcome() {
    let launcher = Arc::new(FakeLauncher::new([dom_for("outlook")]));
    let coordinator = ProviderCoordinator::new(
        Arc::new(ProviderCatalog::builtin()),
        launcher,
        ExecutorConfig {
            dry_run: true,
            ..Default::default()
        },
    );
    let results = coordinator
        .run(
            &intent(),
            &["outlook"],
            &SessionOptions::default(),
            &ExecutionContext::detached("t"),
        )
        .await
        .unwrap();
    assert!(results["outlook"].success);
    assert!(results["outlook"].dry_run);
}

#[tokio::test(start_paused = true)]
async fn test_analyze() {
    let dom = dom_for("gmail");
    let launcher = Arc::new(FakeLauncher::new([dom.clone()]));
    let analysis = coordinator(launcher)
        .analyze("GMAIL", &SessionOptions::default())
        .await
        .unwrap();
    assert_eq!(analysis.provider, "gmail");
    assert_eq!(analysis.url, "https://mail.google.com");
    assert!(dom.is_closed());
}

#[test]
fn test_outcome_serialization() {
    let outcome = ProviderOutcome::failed(&EngineError::UnsupportedProvider("x".into()), None);
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error_kind"], "unsupported_provider");
    assert!(json.get("dry_run").is_none());
    assert!(json.get("failure").is_none());
}
