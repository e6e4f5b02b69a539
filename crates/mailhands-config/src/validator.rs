//! Configuration validation.

use std::str::FromStr;

use mailhands_protocols::{Field, LocatorSet};

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Collapse into the first error, if any.
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(e) => Err(ConfigError::InvalidValue {
                field: e.path,
                message: e.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration against the set of provider names the
    /// runtime knows about.
    pub fn validate(
        config: &Config,
        known_providers: &[&str],
    ) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_browser(config, &mut result);
        Self::validate_engine(config, &mut result);
        Self::validate_providers(config, known_providers, &mut result);

        Ok(result)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }
        if config.server.host.trim().is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        let browser = &config.browser;
        if browser.debug_port == 0 {
            result.add_error(ValidationError::new(
                "browser.debug_port",
                "Debug port cannot be 0",
            ));
        }
        if browser.window_width == 0 || browser.window_height == 0 {
            result.add_error(ValidationError::new(
                "browser.window_width",
                "Window dimensions must be greater than 0",
            ));
        }
        if browser.headless && !browser.persist_profile {
            result.add_warning(ValidationWarning::new(
                "browser.headless",
                "Headless mode without a persisted profile leaves no way to log in manually",
            ));
        }
    }

    fn validate_engine(config: &Config, result: &mut ValidationResult) {
        let engine = &config.engine;
        if engine.locator_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "engine.locator_timeout_ms",
                "Locator timeout must be greater than 0",
            ));
        }
        if engine.poll_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "engine.poll_interval_ms",
                "Poll interval must be greater than 0",
            ));
        } else if engine.poll_interval_ms >= engine.locator_timeout_ms {
            result.add_error(ValidationError::new(
                "engine.poll_interval_ms",
                "Poll interval must be shorter than the locator timeout",
            ));
        }
        if engine.auth_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "engine.auth_timeout_secs",
                "Authentication timeout must be greater than 0",
            ));
        }
    }

    fn validate_providers(config: &Config, known: &[&str], result: &mut ValidationResult) {
        for (name, over) in &config.providers {
            let prefix = format!("providers.{}", name);

            if !known.iter().any(|k| k.eq_ignore_ascii_case(name)) {
                result.add_error(ValidationError::new(
                    &prefix,
                    format!("Unknown provider '{}'", name),
                ));
                continue;
            }

            if let Some(url) = &over.base_url {
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    result.add_error(ValidationError::new(
                        format!("{}.base_url", prefix),
                        "Base URL must be http(s)",
                    ));
                }
            }

            if !over.recipient_readback.is_empty() {
                if let Err(e) = LocatorSet::parse(&over.recipient_readback) {
                    result.add_error(ValidationError::new(
                        format!("{}.recipient_readback", prefix),
                        e.to_string(),
                    ));
                }
            }

            for (field, locators) in &over.locators {
                let path = format!("{}.locators.{}", prefix, field);
                if let Err(e) = Field::from_str(field) {
                    result.add_error(ValidationError::new(&path, e));
                    continue;
                }
                if let Err(e) = LocatorSet::parse(locators) {
                    result.add_error(ValidationError::new(&path, e.to_string()));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
