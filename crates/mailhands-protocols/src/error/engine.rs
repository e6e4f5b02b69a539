//! Action engine errors and their serializable kinds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Field, Locator};

/// Errors surfaced by the action engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("Element not found for {provider}/{field} after trying {}", format_tried(.tried))]
    ElementNotFound {
        provider: String,
        field: Field,
        tried: Vec<Locator>,
    },

    #[error("Navigation to {url} failed for {provider}: {reason}")]
    NavigationError {
        provider: String,
        url: String,
        reason: String,
    },

    #[error("{provider} login was not completed within {waited_secs}s")]
    AuthenticationTimeout { provider: String, waited_secs: u64 },

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Unparsable instruction: {0}")]
    UnparsableInstruction(String),

    #[error("Browser session crashed: {0}")]
    SessionCrashed(String),

    #[error("{provider}/{field} holds {actual:?}, expected {expected:?}")]
    FieldMismatch {
        provider: String,
        field: Field,
        expected: String,
        actual: String,
    },

    #[error("{provider} blocked automation ({marker})")]
    ProviderBlocked { provider: String, marker: String },

    /// The page is alive but rejected an interaction, e.g. a script error or
    /// an unanswered command.
    #[error("{provider} {action} failed: {reason}")]
    ActionFailed {
        provider: String,
        action: String,
        reason: String,
    },
}

fn format_tried(tried: &[Locator]) -> String {
    tried
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error classification reported per provider and over the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ElementNotFound,
    NavigationError,
    AuthenticationTimeout,
    UnsupportedProvider,
    TaskNotFound,
    UnparsableInstruction,
    SessionCrashed,
    FieldMismatch,
    ProviderBlocked,
    ActionFailed,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::ElementNotFound { .. } => ErrorKind::ElementNotFound,
            EngineError::NavigationError { .. } => ErrorKind::NavigationError,
            EngineError::AuthenticationTimeout { .. } => ErrorKind::AuthenticationTimeout,
            EngineError::UnsupportedProvider(_) => ErrorKind::UnsupportedProvider,
            EngineError::TaskNotFound(_) => ErrorKind::TaskNotFound,
            EngineError::UnparsableInstruction(_) => ErrorKind::UnparsableInstruction,
            EngineError::SessionCrashed(_) => ErrorKind::SessionCrashed,
            EngineError::FieldMismatch { .. } => ErrorKind::FieldMismatch,
            EngineError::ProviderBlocked { .. } => ErrorKind::ProviderBlocked,
            EngineError::ActionFailed { .. } => ErrorKind::ActionFailed,
        }
    }

    /// Errors reported to the caller before any browser work starts.
    pub fn is_fail_fast(&self) -> bool {
        matches!(
            self,
            EngineError::UnsupportedProvider(_) | EngineError::UnparsableInstruction(_)
        )
    }
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ElementNotFound => "element_not_found",
            ErrorKind::NavigationError => "navigation_error",
            ErrorKind::AuthenticationTimeout => "authentication_timeout",
            ErrorKind::UnsupportedProvider => "unsupported_provider",
            ErrorKind::TaskNotFound => "task_not_found",
            ErrorKind::UnparsableInstruction => "unparsable_instruction",
            ErrorKind::SessionCrashed => "session_crashed",
            ErrorKind::FieldMismatch => "field_mismatch",
            ErrorKind::ProviderBlocked => "provider_blocked",
            ErrorKind::ActionFailed => "action_failed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
