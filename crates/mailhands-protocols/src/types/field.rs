//! UI fields addressed by the compose workflow.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::EmailIntent;

/// A UI element the compose workflow interacts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Compose,
    Recipient,
    Subject,
    Body,
    Send,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Compose,
        Field::Recipient,
        Field::Subject,
        Field::Body,
        Field::Send,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Compose => "compose",
            Field::Recipient => "recipient",
            Field::Subject => "subject",
            Field::Body => "body",
            Field::Send => "send",
        }
    }

    /// The intent value typed into this field, if it is a text field.
    pub fn intent_value<'a>(&self, intent: &'a EmailIntent) -> Option<&'a str> {
        match self {
            Field::Recipient => Some(intent.recipient()),
            Field::Subject => Some(intent.subject()),
            Field::Body => Some(intent.body()),
            Field::Compose | Field::Send => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compose" => Ok(Field::Compose),
            "recipient" | "to" => Ok(Field::Recipient),
            "subject" => Ok(Field::Subject),
            "body" => Ok(Field::Body),
            "send" => Ok(Field::Send),
            other => Err(format!("unknown field '{}'", other)),
        }
    }
}
