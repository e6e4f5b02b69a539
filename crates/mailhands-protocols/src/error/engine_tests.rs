use super::*;

#[test]
fn test_element_not_found_lists_candidates_in_order() {
    let err = EngineError::ElementNotFound {
        provider: "gmail".to_string(),
        field: Field::Compose,
        tried: vec![
            Locator::css("div[gh='cm']"),
            Locator::label("Compose"),
            Locator::test_id("compose"),
        ],
    };
    let display = err.to_string();
    assert!(display.contains("gmail/compose"));
    let css = display.find("css:div[gh='cm']").unwrap();
    let label = display.find("label:Compose").unwrap();
    let test_id = display.find("testid:compose").unwrap();
    assert!(css < label && label < test_id);
}

#[test]
fn test_kind_mapping() {
    assert_eq!(
        EngineError::UnsupportedProvider("yahoo".to_string()).kind(),
        ErrorKind::UnsupportedProvider
    );
    assert_eq!(
        EngineError::AuthenticationTimeout {
            provider: "outlook".to_string(),
            waited_secs: 60
        }
        .kind(),
        ErrorKind::AuthenticationTimeout
    );
    assert_eq!(
        EngineError::SessionCrashed("ws closed".to_string()).kind(),
        ErrorKind::SessionCrashed
    );
}

#[test]
fn test_fail_fast_errors() {
    assert!(EngineError::UnsupportedProvider("yahoo".to_string()).is_fail_fast());
    assert!(EngineError::UnparsableInstruction("no address".to_string()).is_fail_fast());
    assert!(!EngineError::TaskNotFound("x".to_string()).is_fail_fast());
}

#[test]
fn test_error_kind_serialize() {
    let json = serde_json::to_string(&ErrorKind::ElementNotFound).unwrap();
    assert_eq!(json, "\"element_not_found\"");
    let kind: ErrorKind = serde_json::from_str("\"authentication_timeout\"").unwrap();
    assert_eq!(kind, ErrorKind::AuthenticationTimeout);
    assert_eq!(kind.to_string(), "authentication_timeout");
}

#[test]
fn test_field_mismatch_display() {
    let err = EngineError::FieldMismatch {
        provider: "gmail".to_string(),
        field: Field::Subject,
        expected: "quarterly report".to_string(),
        actual: "".to_string(),
    };
    assert!(err.to_string().contains("gmail/subject"));
    assert!(err.to_string().contains("quarterly report"));
}

#[test]
fn test_action_failed_is_not_a_crash() {
    let err = EngineError::ActionFailed {
        provider: "gmail".to_string(),
        action: "click send".to_string(),
        reason: "Script error: Node is not clickable".to_string(),
    };
    assert_eq!(err.kind(), ErrorKind::ActionFailed);
    assert_eq!(err.kind().to_string(), "action_failed");
    assert!(err.to_string().contains("gmail click send failed"));
    assert!(!err.is_fail_fast());
}
