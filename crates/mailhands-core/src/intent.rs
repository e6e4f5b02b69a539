//! Rule-based intent extraction.

use std::sync::OnceLock;

use mailhands_protocols::{EmailIntent, EngineError, IntentParser, is_valid_email};
use regex::Regex;
use tracing::debug;

pub const DEFAULT_SUBJECT: &str = "Automated Email";

fn about_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)\babout\s+(.*?)(?:\s+saying\b|\.|$)").unwrap())
}

fn subject_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)\bsubject\b[\s:]*(.*?)(?:\s+saying\b|$)").unwrap())
}

fn saying_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)\bsaying\b\s*(.*)$").unwrap())
}

/// Pattern-matching [`IntentParser`].
///
/// - recipient: the address following the word "to", else the first address
///   anywhere in the text
/// - subject: text after "about" up to "saying" or the first period, or text
///   after "subject"
/// - body: text after "saying", without surrounding quotes
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternIntentParser;

impl PatternIntentParser {
    pub fn new() -> Self {
        Self
    }

    fn recipient(instruction: &str) -> Option<String> {
        let tokens: Vec<String> = instruction.split_whitespace().map(clean_token).collect();

        let after_to = tokens
            .windows(2)
            .find(|w| w[0].eq_ignore_ascii_case("to") && is_valid_email(&w[1]))
            .map(|w| w[1].clone());

        after_to.or_else(|| tokens.into_iter().find(|t| is_valid_email(t)))
    }

    fn subject(instruction: &str) -> String {
        let captured = about_regex()
            .captures(instruction)
            .or_else(|| subject_regex().captures(instruction))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim());

        let subject = match captured {
            Some(s) => strip_article(s),
            None => "",
        };
        if subject.is_empty() {
            DEFAULT_SUBJECT.to_string()
        } else {
            subject.to_string()
        }
    }

    fn body(instruction: &str) -> String {
        saying_regex()
            .captures(instruction)
            .and_then(|c| c.get(1))
            .map(|m| strip_quotes(m.as_str().trim()).to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| {
                format!("This email was sent automatically based on: {}", instruction)
            })
    }
}

impl IntentParser for PatternIntentParser {
    fn parse(&self, instruction: &str) -> Result<EmailIntent, EngineError> {
        let instruction = instruction.trim();
        let recipient = Self::recipient(instruction).ok_or_else(|| {
            EngineError::UnparsableInstruction(format!(
                "no recipient email address in '{}'",
                instruction
            ))
        })?;

        let intent = EmailIntent::new(
            recipient,
            Self::subject(instruction),
            Self::body(instruction),
            instruction,
        )?;
        debug!(
            "Parsed intent: to={} subject={:?}",
            intent.recipient(),
            intent.subject()
        );
        Ok(intent)
    }
}

fn clean_token(token: &str) -> String {
    token
        .trim_start_matches(['(', '<', '"', '\'', '['])
        .trim_end_matches([',', '.', ';', ':', '!', '?', ')', '>', '"', '\'', ']'])
        .to_string()
}

fn strip_article(s: &str) -> &str {
    match s.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("the ") => s[4..].trim_start(),
        _ => s,
    }
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches(['"', '\'', '“', '”', '‘', '’'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(instruction: &str) -> EmailIntent {
        PatternIntentParser.parse(instruction).unwrap()
    }

    #[test]
    fn test_full_instruction() {
        let intent = parse(
            "Send an email to alice@example.com about the quarterly report saying 'Please review the attached document'",
        );
        assert_eq!(intent.recipient(), "alice@example.com");
        assert_eq!(intent.subject(), "quarterly report");
        assert_eq!(intent.body(), "Please review the attached document");
    }

    #[test]
    fn test_subject_stops_at_period() {
        let intent = parse("Email bob@example.org about lunch plans. Keep it short");
        assert_eq!(intent.subject(), "lunch plans");
    }

    #[test]
    fn test_subject_keyword() {
        let intent = parse("Write to carol@example.com with subject: Project kickoff");
        assert_eq!(intent.subject(), "Project kickoff");
    }

    #[test]
    fn test_defaults() {
        let instruction = "Ping dave@example.com";
        let intent = parse(instruction);
        assert_eq!(intent.subject(), DEFAULT_SUBJECT);
        assert_eq!(
            intent.body(),
            "This email was sent automatically based on: Ping dave@example.com"
        );
        assert_eq!(intent.raw_instruction(), instruction);
    }

    #[test]
    fn test_recipient_punctuation_stripped() {
        let intent = parse("Send a note to erin@example.com, saying \"hi there\"");
        assert_eq!(intent.recipient(), "erin@example.com");
        assert_eq!(intent.body(), "hi there");
    }

    #[test]
    fn test_prefers_address_after_to() {
        let intent = parse("From frank@example.com send to grace@example.com saying ok");
        assert_eq!(intent.recipient(), "grace@example.com");
    }

    #[test]
    fn test_no_recipient() {
        let err = PatternIntentParser
            .parse("Send an email to Alice about the report")
            .unwrap_err();
        assert!(matches!(err, EngineError::UnparsableInstruction(_)));
    }

    #[test]
    fn test_article_strip_is_utf8_safe() {
        let intent = parse("Mail hi@example.com about é");
        assert_eq!(intent.subject(), "é");
    }
}
