//! Structured email intent.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::EngineError;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$")
            .expect("email pattern is valid")
    })
}

/// Whether `candidate` is syntactically an email address.
pub fn is_valid_email(candidate: &str) -> bool {
    email_regex().is_match(candidate)
}

/// Structured record derived from a natural-language instruction.
///
/// Immutable once built; the recipient is always a syntactically valid address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailIntent {
    recipient: String,
    subject: String,
    body: String,
    raw_instruction: String,
}

impl EmailIntent {
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        raw_instruction: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let recipient = recipient.into();
        if !is_valid_email(&recipient) {
            return Err(EngineError::UnparsableInstruction(format!(
                "'{}' is not a valid email address",
                recipient
            )));
        }
        Ok(Self {
            recipient,
            subject: subject.into(),
            body: body.into(),
            raw_instruction: raw_instruction.into(),
        })
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn raw_instruction(&self) -> &str {
        &self.raw_instruction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("first.last+tag@sub.domain.org"));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("alice.example.com"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("alice@example.com,"));
    }

    #[test]
    fn test_new_rejects_invalid_recipient() {
        let err = EmailIntent::new("nobody", "s", "b", "raw").unwrap_err();
        assert!(matches!(err, EngineError::UnparsableInstruction(_)));
    }

    #[test]
    fn test_accessors() {
        let intent = EmailIntent::new(
            "alice@example.com",
            "quarterly report",
            "Please review the attached document",
            "Send an email to alice@example.com",
        )
        .unwrap();
        assert_eq!(intent.recipient(), "alice@example.com");
        assert_eq!(intent.subject(), "quarterly report");
        assert_eq!(intent.body(), "Please review the attached document");
        assert_eq!(intent.raw_instruction(), "Send an email to alice@example.com");
    }
}
