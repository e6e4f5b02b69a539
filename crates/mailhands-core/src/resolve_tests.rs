use super::*;
use crate::testing::{FakeDom, FakeElement};

fn candidates() -> LocatorSet {
    LocatorSet::parse(&[
        "css:div[gh='cm']",
        "label:Compose",
        "testid:compose-button",
    ])
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_third_candidate_matches() {
    let dom = FakeDom::new();
    let third = Locator::test_id("compose-button");
    dom.insert(&third, FakeElement::new("div"));
    let mut page = dom.page();

    let element = resolve(
        &mut page,
        "gmail",
        Field::Compose,
        &candidates(),
        WaitPolicy::default(),
    )
    .await
    .unwrap();

    assert_eq!(element.locator, third);
    // Earlier candidates were tried first, in declared order.
    let lookups = dom.lookups();
    assert_eq!(lookups.first().unwrap(), &candidates().as_slice()[0]);
    assert_eq!(lookups.last().unwrap(), &third);
    let first_label = lookups
        .iter()
        .position(|l| l == &candidates().as_slice()[1])
        .unwrap();
    let last_css = lookups
        .iter()
        .rposition(|l| l == &candidates().as_slice()[0])
        .unwrap();
    assert!(last_css < first_label);
}

#[tokio::test(start_paused = true)]
async fn test_no_candidate_matches() {
    let dom = FakeDom::new();
    let mut page = dom.page();
    let started = Instant::now();

    let err = resolve(
        &mut page,
        "outlook",
        Field::Send,
        &candidates(),
        WaitPolicy::default(),
    )
    .await
    .unwrap_err();

    match err {
        EngineError::ElementNotFound {
            provider,
            field,
            tried,
        } => {
            assert_eq!(provider, "outlook");
            assert_eq!(field, Field::Send);
            assert_eq!(tried, candidates().as_slice().to_vec());
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Each candidate gets its own 5s bound.
    assert!(started.elapsed() >= Duration::from_secs(15));
    assert!(started.elapsed() < Duration::from_secs(16));
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_late_element() {
    let dom = FakeDom::new();
    let first = Locator::css("div[gh='cm']");
    dom.appear_after(&first, 10, FakeElement::new("div"));
    let mut page = dom.page();

    let element = resolve(
        &mut page,
        "gmail",
        Field::Compose,
        &candidates(),
        WaitPolicy::default(),
    )
    .await
    .unwrap();

    assert_eq!(element.locator, first);
    assert_eq!(dom.lookups().len(), 10);
}

#[tokio::test(start_paused = true)]
async fn test_hidden_element_is_skipped() {
    let dom = FakeDom::new();
    dom.insert(&Locator::css("div[gh='cm']"), FakeElement::new("div").hidden());
    dom.insert(&Locator::label("Compose"), FakeElement::new("div").disabled());
    dom.insert(&Locator::test_id("compose-button"), FakeElement::new("div"));
    let mut page = dom.page();

    let element = resolve(
        &mut page,
        "gmail",
        Field::Compose,
        &candidates(),
        WaitPolicy {
            timeout: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
        },
    )
    .await
    .unwrap();
    assert_eq!(element.locator, Locator::test_id("compose-button"));
}

#[tokio::test(start_paused = true)]
async fn test_fatal_driver_error_aborts() {
    let dom = FakeDom::new();
    dom.crash_after(3);
    let mut page = dom.page();

    let err = resolve(
        &mut page,
        "gmail",
        Field::Compose,
        &candidates(),
        WaitPolicy::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, EngineError::SessionCrashed(_)));
}
