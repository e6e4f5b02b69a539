//! Element locators and ordered fallback sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a locator value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    /// A CSS selector.
    Css,
    /// Substring of the element's `aria-label`.
    AccessibilityLabel,
    /// Exact `data-testid` attribute value.
    TestId,
}

impl LocatorStrategy {
    fn prefix(&self) -> &'static str {
        match self {
            LocatorStrategy::Css => "css",
            LocatorStrategy::AccessibilityLabel => "label",
            LocatorStrategy::TestId => "testid",
        }
    }
}

/// A strategy + value pair used to find one UI element.
///
/// Written as `css:<selector>`, `label:<aria-label>` or `testid:<id>`;
/// a string without a known prefix is a CSS selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locator {
    pub strategy: LocatorStrategy,
    pub value: String,
}

/// Locator parsing and construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("Locator value is empty: {0:?}")]
    EmptyValue(String),

    #[error("Locator set is empty")]
    EmptySet,
}

impl Locator {
    pub fn new(strategy: LocatorStrategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Css, value)
    }

    pub fn label(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::AccessibilityLabel, value)
    }

    pub fn test_id(value: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::TestId, value)
    }

    /// Equivalent CSS selector, for drivers that only speak CSS.
    pub fn css_selector(&self) -> String {
        match self.strategy {
            LocatorStrategy::Css => self.value.clone(),
            LocatorStrategy::AccessibilityLabel => {
                format!("[aria-label*=\"{}\"]", escape_attr(&self.value))
            }
            LocatorStrategy::TestId => {
                format!("[data-testid=\"{}\"]", escape_attr(&self.value))
            }
        }
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.strategy.prefix(), self.value)
    }
}

impl FromStr for Locator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (strategy, value) = if let Some(rest) = trimmed.strip_prefix("css:") {
            (LocatorStrategy::Css, rest)
        } else if let Some(rest) = trimmed.strip_prefix("label:") {
            (LocatorStrategy::AccessibilityLabel, rest)
        } else if let Some(rest) = trimmed.strip_prefix("testid:") {
            (LocatorStrategy::TestId, rest)
        } else {
            (LocatorStrategy::Css, trimmed)
        };

        let value = value.trim();
        if value.is_empty() {
            return Err(LocatorError::EmptyValue(s.to_string()));
        }
        Ok(Self::new(strategy, value))
    }
}

impl TryFrom<String> for Locator {
    type Error = LocatorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Locator> for String {
    fn from(locator: Locator) -> Self {
        locator.to_string()
    }
}

/// Ordered fallback list of locators for one (provider, field) pair.
///
/// Never empty. Resolution tries entries in order and stops at the first match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Locator>", into = "Vec<Locator>")]
pub struct LocatorSet {
    locators: Vec<Locator>,
}

impl LocatorSet {
    pub fn new(locators: Vec<Locator>) -> Result<Self, LocatorError> {
        if locators.is_empty() {
            return Err(LocatorError::EmptySet);
        }
        Ok(Self { locators })
    }

    /// Parse a list of locator strings.
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Result<Self, LocatorError> {
        let locators = specs
            .iter()
            .map(|s| s.as_ref().parse())
            .collect::<Result<Vec<Locator>, _>>()?;
        Self::new(locators)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Locator> {
        self.locators.iter()
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn as_slice(&self) -> &[Locator] {
        &self.locators
    }
}

impl TryFrom<Vec<Locator>> for LocatorSet {
    type Error = LocatorError;

    fn try_from(value: Vec<Locator>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LocatorSet> for Vec<Locator> {
    fn from(set: LocatorSet) -> Self {
        set.locators
    }
}

impl<'a> IntoIterator for &'a LocatorSet {
    type Item = &'a Locator;
    type IntoIter = std::slice::Iter<'a, Locator>;

    fn into_iter(self) -> Self::IntoIter {
        self.locators.iter()
    }
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;
