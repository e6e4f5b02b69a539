use std::sync::Arc;

use super::*;
use crate::diagnostics::FileDiagnostics;
use crate::providers::ProviderCatalog;
use crate::testing::{FakeDom, FakeElement};
use mailhands_protocols::{ErrorKind, Locator};

fn intent() -> EmailIntent {
    EmailIntent::new(
        "alice@example.com",
        "quarterly report",
        "Please review the attached document",
        "Send an email to alice@example.com about the quarterly report",
    )
    .unwrap()
}

fn gmail() -> Arc<ProviderSpec> {
    ProviderCatalog::builtin().get("gmail").unwrap()
}

fn first(spec: &ProviderSpec, field: Field) -> Locator {
    spec.locators(field).unwrap().as_slice()[0].clone()
}

fn session_on(dom: &FakeDom, provider: &str) -> Session {
    let mut session = Session::new(provider);
    session.attach(Box::new(dom.page())).unwrap();
    session
}

fn executor() -> ActionExecutor {
    ActionExecutor::new(ExecutorConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_full_workflow_succeeds() {
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    let mut session = session_on(&dom, "gmail");
    let ctx = ExecutionContext::detached("t1");

    let report = executor()
        .execute(&mut session, &spec, &intent(), &ctx)
        .await
        .unwrap();

    assert_eq!(report.provider, "gmail");
    assert_eq!(report.steps_completed, spec.workflow().len());
    assert!(!report.dry_run);

    assert_eq!(
        dom.element(&first(&spec, Field::Recipient)).unwrap().value,
        "alice@example.com"
    );
    assert_eq!(
        dom.element(&first(&spec, Field::Subject)).unwrap().value,
        "quarterly report"
    );
    assert_eq!(dom.element(&first(&spec, Field::Send)).unwrap().clicks, 1);

    let actions = dom.actions();
    let expected = vec![
        "navigate https://mail.google.com".to_string(),
        format!("click {}", first(&spec, Field::Compose)),
        format!("fill {}", first(&spec, Field::Recipient)),
        format!("fill {}", first(&spec, Field::Subject)),
        format!("fill {}", first(&spec, Field::Body)),
        format!("click {}", first(&spec, Field::Send)),
    ];
    assert_eq!(actions, expected);
}

#[tokio::test(start_paused = true)]
async fn test_typing_replaces_existing_content() {
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    let subject = first(&spec, Field::Subject);
    dom.insert(&subject, FakeElement::new("input").with_value("draft subject"));

    let mut session = session_on(&dom, "gmail");
    executor()
        .execute(&mut session, &spec, &intent(), &ExecutionContext::detached("t"))
        .await
        .unwrap();
    assert_eq!(dom.element(&subject).unwrap().value, "quarterly report");

    // A second run with a different intent leaves only the second value.
    let second = EmailIntent::new("bob@example.com", "follow-up", "ping", "raw").unwrap();
    let mut session = session_on(&dom, "gmail");
    executor()
        .execute(&mut session, &spec, &second, &ExecutionContext::detached("t"))
        .await
        .unwrap();
    assert_eq!(dom.element(&subject).unwrap().value, "follow-up");
    assert_eq!(
        dom.element(&first(&spec, Field::Recipient)).unwrap().value,
        "bob@example.com"
    );
}

#[tokio::test(start_paused = true)]
async fn test_fallback_locator_is_used() {
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    let compose = spec.locators(Field::Compose).unwrap().as_slice().to_vec();
    dom.remove(&compose[0]);
    dom.insert(&compose[2], FakeElement::new("div"));

    let mut session = session_on(&dom, "gmail");
    executor()
        .execute(&mut session, &spec, &intent(), &ExecutionContext::detached("t"))
        .await
        .unwrap();
    assert_eq!(dom.element(&compose[2]).unwrap().clicks, 1);
}

#[tokio::test(start_paused = true)]
async fn test_authentication_timeout() {
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    dom.set_landing_url("https://accounts.google.com/v3/signin/identifier");
    let mut session = session_on(&dom, "gmail");
    let started = Instant::now();

    let failure = executor()
        .execute(&mut session, &spec, &intent(), &ExecutionContext::detached("t"))
        .await
        .unwrap_err();

    match failure.error {
        EngineError::AuthenticationTimeout {
            ref provider,
            waited_secs,
        } => {
            assert_eq!(provider, "gmail");
            assert_eq!(waited_secs, 60);
        }
        ref other => panic!("unexpected error: {other:?}"),
    }
    assert!(started.elapsed() >= Duration::from_secs(60));
    assert!(started.elapsed() < Duration::from_secs(62));
    assert_eq!(failure.context.step, "wait_for_auth");
    assert_eq!(
        failure.context.url.as_deref(),
        Some("https://accounts.google.com/v3/signin/identifier")
    );
    // Nothing was typed or sent.
    assert!(!dom.actions().iter().any(|a| a.starts_with("fill") || a.starts_with("click")));
}

#[tokio::test(start_paused = true)]
async fn test_authentication_completes_during_wait() {
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    dom.script_urls([
        "https://accounts.google.com/signin",
        "https://accounts.google.com/signin",
        "https://accounts.google.com/signin/challenge",
        "https://mail.google.com/mail/u/0/#inbox",
    ]);
    let mut session = session_on(&dom, "gmail");

    let report = executor()
        .execute(&mut session, &spec, &intent(), &ExecutionContext::detached("t"))
        .await
        .unwrap();
    assert_eq!(report.steps_completed, spec.workflow().len());
}

#[tokio::test(start_paused = true)]
async fn test_blocked_provider() {
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    dom.set_landing_url("https://accounts.google.com/signin");
    dom.set_source("<p>This browser or app may not be secure. Try another browser.</p>");
    let mut session = session_on(&dom, "gmail");

    let failure = executor()
        .execute(&mut session, &spec, &intent(), &ExecutionContext::detached("t"))
        .await
        .unwrap_err();
    assert_eq!(failure.error.kind(), ErrorKind::ProviderBlocked);
    assert_eq!(failure.context.step, "navigate");
}

#[tokio::test(start_paused = true)]
async fn test_missing_element_aborts_before_send() {
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    dom.remove(&first(&spec, Field::Body));
    let mut session = session_on(&dom, "gmail");

    let failure = executor()
        .execute(&mut session, &spec, &intent(), &ExecutionContext::detached("t"))
        .await
        .unwrap_err();

    match &failure.error {
        EngineError::ElementNotFound { field, tried, .. } => {
            assert_eq!(*field, Field::Body);
            assert_eq!(tried.len(), spec.locators(Field::Body).unwrap().len());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(failure.context.step, "type_body");
    assert_eq!(failure.context.url.as_deref(), Some("https://mail.google.com"));
    assert_eq!(dom.element(&first(&spec, Field::Send)).unwrap().clicks, 0);
}

#[tokio::test(start_paused = true)]
async fn test_field_mismatch_blocks_send() {
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    let recipient = first(&spec, Field::Recipient);
    dom.insert(&recipient, FakeElement::new("input").frozen());
    let mut session = session_on(&dom, "gmail");

    let failure = executor()
        .execute(&mut session, &spec, &intent(), &ExecutionContext::detached("t"))
        .await
        .unwrap_err();

    assert!(matches!(
        failure.error,
        EngineError::FieldMismatch { field: Field::Recipient, .. }
    ));
    assert_eq!(failure.context.step, "click_send");
    assert_eq!(dom.element(&first(&spec, Field::Send)).unwrap().clicks, 0);
}

#[tokio::test(start_paused = true)]
async fn test_dry_run_never_clicks_send() {
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    let mut session = session_on(&dom, "gmail");
    let executor = ActionExecutor::new(ExecutorConfig {
        dry_run: true,
        ..Default::default()
    });

    let report = executor
        .execute(&mut session, &spec, &intent(), &ExecutionContext::detached("t"))
        .await
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(dom.element(&first(&spec, Field::Send)).unwrap().clicks, 0);
    assert_eq!(
        dom.element(&first(&spec, Field::Body)).unwrap().value,
        "Please review the attached document"
    );
}

#[tokio::test(start_paused = true)]
async fn test_navigation_error() {
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    dom.fail_navigation(DriverError::Navigation("net::ERR_NAME_NOT_RESOLVED".to_string()));
    let mut session = session_on(&dom, "gmail");

    let failure = executor()
        .execute(&mut session, &spec, &intent(), &ExecutionContext::detached("t"))
        .await
        .unwrap_err();
    match failure.error {
        EngineError::NavigationError { url, reason, .. } => {
            assert_eq!(url, "https://mail.google.com");
            assert!(reason.contains("ERR_NAME_NOT_RESOLVED"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_driver_crash_mid_sequence() {
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    dom.crash_after(6);
    let mut session = session_on(&dom, "gmail");

    let failure = executor()
        .execute(&mut session, &spec, &intent(), &ExecutionContext::detached("t"))
        .await
        .unwrap_err();
    assert_eq!(failure.error.kind(), ErrorKind::SessionCrashed);
    assert!(failure.context.url.is_none());
    assert!(failure.context.snapshot.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failure_snapshot_written() {
    let dir = tempfile::tempdir().unwrap();
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    dom.remove(&first(&spec, Field::Compose));
    let mut session = session_on(&dom, "gmail");
    let ctx = ExecutionContext::new("t", Arc::new(FileDiagnostics::new(dir.path())));

    let failure = executor()
        .execute(&mut session, &spec, &intent(), &ctx)
        .await
        .unwrap_err();
    let snapshot = failure.context.snapshot.unwrap();
    assert!(snapshot.starts_with(dir.path()));
    assert!(snapshot.exists());
}

#[tokio::test(start_paused = true)]
async fn test_script_error_on_send_keeps_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    let send = first(&spec, Field::Send);
    dom.fail_action(&send, DriverError::Script("Node is not clickable".to_string()));
    let mut session = session_on(&dom, "gmail");
    let ctx = ExecutionContext::new("t", Arc::new(FileDiagnostics::new(dir.path())));

    let failure = executor()
        .execute(&mut session, &spec, &intent(), &ctx)
        .await
        .unwrap_err();

    match &failure.error {
        EngineError::ActionFailed { provider, action, reason } => {
            assert_eq!(provider, "gmail");
            assert_eq!(action, "click send");
            assert!(reason.contains("Node is not clickable"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(failure.context.step, "click_send");
    assert_eq!(failure.context.url.as_deref(), Some("https://mail.google.com"));
    assert!(failure.context.snapshot.unwrap().exists());
    assert_eq!(dom.element(&send).unwrap().clicks, 0);
    assert!(!dom.actions().iter().any(|a| a == "close"));
}

#[tokio::test(start_paused = true)]
async fn test_stale_element_is_resolved_again() {
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    let compose = first(&spec, Field::Compose);
    dom.stale_once(&compose);
    let mut session = session_on(&dom, "gmail");

    let report = executor()
        .execute(&mut session, &spec, &intent(), &ExecutionContext::detached("t"))
        .await
        .unwrap();

    assert_eq!(report.steps_completed, spec.workflow().len());
    assert_eq!(dom.element(&compose).unwrap().clicks, 1);
    assert_eq!(dom.element(&first(&spec, Field::Send)).unwrap().clicks, 1);
}

#[tokio::test(start_paused = true)]
async fn test_element_stale_twice_is_not_found() {
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    let subject = first(&spec, Field::Subject);
    dom.go_stale(&subject, 2);
    let mut session = session_on(&dom, "gmail");

    let failure = executor()
        .execute(&mut session, &spec, &intent(), &ExecutionContext::detached("t"))
        .await
        .unwrap_err();

    match &failure.error {
        EngineError::ElementNotFound { field, tried, .. } => {
            assert_eq!(*field, Field::Subject);
            assert_eq!(tried.len(), spec.locators(Field::Subject).unwrap().len());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(failure.context.step, "type_subject");
    assert_eq!(failure.context.url.as_deref(), Some("https://mail.google.com"));
    assert_eq!(dom.element(&first(&spec, Field::Send)).unwrap().clicks, 0);
}

#[tokio::test(start_paused = true)]
async fn test_recipient_chip_satisfies_verification() {
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    let recipient = first(&spec, Field::Recipient);
    let chips = spec.recipient_readback().unwrap().as_slice()[0].clone();
    dom.chip_on_fill(&recipient, &chips);
    let mut session = session_on(&dom, "gmail");

    let report = executor()
        .execute(&mut session, &spec, &intent(), &ExecutionContext::detached("t"))
        .await
        .unwrap();

    assert_eq!(report.steps_completed, spec.workflow().len());
    assert_eq!(dom.element(&recipient).unwrap().value, "");
    assert_eq!(dom.element(&chips).unwrap().value, "alice@example.com");
    assert_eq!(dom.element(&first(&spec, Field::Send)).unwrap().clicks, 1);
}

#[tokio::test(start_paused = true)]
async fn test_cleared_recipient_without_chip_blocks_send() {
    let spec = gmail();
    let dom = FakeDom::for_provider(&spec);
    let recipient = first(&spec, Field::Recipient);
    let chips = spec.recipient_readback().unwrap().as_slice()[0].clone();
    dom.chip_on_fill(&recipient, &chips);
    dom.remove(&chips);
    let mut session = session_on(&dom, "gmail");

    let failure = executor()
        .execute(&mut session, &spec, &intent(), &ExecutionContext::detached("t"))
        .await
        .unwrap_err();

    assert!(matches!(
        failure.error,
        EngineError::FieldMismatch { field: Field::Recipient, .. }
    ));
    assert_eq!(dom.element(&first(&spec, Field::Send)).unwrap().clicks, 0);
}

#[tokio::test]
async fn test_session_must_be_ready() {
    let spec = gmail();
    let mut session = Session::new("gmail");
    let failure = executor()
        .execute(&mut session, &spec, &intent(), &ExecutionContext::detached("t"))
        .await
        .unwrap_err();
    assert_eq!(failure.error.kind(), ErrorKind::SessionCrashed);
    assert_eq!(failure.context.step, "begin");
}

#[test]
fn test_config_from_engine_config() {
    let engine = EngineConfig {
        locator_timeout_ms: 2_000,
        auth_timeout_secs: 10,
        dry_run: true,
        ..Default::default()
    };
    let config = ExecutorConfig::from(&engine);
    assert_eq!(config.wait.timeout, Duration::from_secs(2));
    assert_eq!(config.auth_timeout, Duration::from_secs(10));
    assert!(config.dry_run);
    assert_eq!(config.auth_poll_interval, Duration::from_secs(1));
}
