//! The fixed compose workflow.

use std::fmt;

use mailhands_protocols::{EmailIntent, Field};
use serde::Serialize;

/// What a step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Navigate,
    Click,
    TypeText,
    /// Suspension point for manual authentication.
    Wait,
}

/// One operation of a provider workflow.
///
/// Text for `TypeText` is not stored here; it is read from the intent field
/// bound to [`ActionStep::field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionStep {
    pub kind: StepKind,
    pub field: Option<Field>,
}

impl ActionStep {
    pub const fn navigate() -> Self {
        Self {
            kind: StepKind::Navigate,
            field: None,
        }
    }

    pub const fn wait_for_auth() -> Self {
        Self {
            kind: StepKind::Wait,
            field: None,
        }
    }

    pub const fn click(field: Field) -> Self {
        Self {
            kind: StepKind::Click,
            field: Some(field),
        }
    }

    pub const fn type_text(field: Field) -> Self {
        Self {
            kind: StepKind::TypeText,
            field: Some(field),
        }
    }

    /// Text this step types, if any.
    pub fn value<'a>(&self, intent: &'a EmailIntent) -> Option<&'a str> {
        match self.kind {
            StepKind::TypeText => self.field.and_then(|f| f.intent_value(intent)),
            _ => None,
        }
    }

    /// Whether this is the irreversible send click.
    pub fn is_send(&self) -> bool {
        self.kind == StepKind::Click && self.field == Some(Field::Send)
    }
}

impl fmt::Display for ActionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.field) {
            (StepKind::Navigate, _) => f.write_str("navigate"),
            (StepKind::Wait, _) => f.write_str("wait_for_auth"),
            (StepKind::Click, Some(field)) => write!(f, "click_{}", field),
            (StepKind::TypeText, Some(field)) => write!(f, "type_{}", field),
            (StepKind::Click, None) => f.write_str("click"),
            (StepKind::TypeText, None) => f.write_str("type"),
        }
    }
}

/// navigate → (auth wait) → open compose → recipient → subject → body → send
pub const COMPOSE_WORKFLOW: &[ActionStep] = &[
    ActionStep::navigate(),
    ActionStep::wait_for_auth(),
    ActionStep::click(Field::Compose),
    ActionStep::type_text(Field::Recipient),
    ActionStep::type_text(Field::Subject),
    ActionStep::type_text(Field::Body),
    ActionStep::click(Field::Send),
];
