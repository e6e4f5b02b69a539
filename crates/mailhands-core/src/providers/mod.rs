//! Provider definitions and the locator table.
//!
//! A provider is data, not code: a [`ProviderSpec`] bundles the base URL,
//! authentication markers, the per-field [`LocatorSet`] table and the fixed
//! [`ActionStep`] workflow. One generic executor drives every provider.

mod gmail;
mod outlook;

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::Arc;

use mailhands_config::{ConfigError, ProviderOverride};
use mailhands_protocols::{EngineError, Field, LocatorSet};
use serde::Serialize;

use crate::step::{ActionStep, COMPOSE_WORKFLOW};

/// Static facts about a built-in provider.
pub(crate) struct ProviderInfo {
    pub name: &'static str,
    pub display_name: &'static str,
    pub base_url: &'static str,
    pub authenticated_host: &'static str,
    pub login_markers: &'static [&'static str],
    pub blocked_markers: &'static [&'static str],
}

/// Everything the executor needs to drive one provider.
#[derive(Debug, Clone)]
pub struct ProviderSpec {
    name: String,
    display_name: String,
    base_url: String,
    authenticated_host: String,
    login_markers: Vec<String>,
    blocked_markers: Vec<String>,
    locators: BTreeMap<Field, LocatorSet>,
    /// Where the compose form shows accepted recipients once the address
    /// input has turned them into chips.
    recipient_readback: Option<LocatorSet>,
    workflow: &'static [ActionStep],
}

impl ProviderSpec {
    fn from_builtin(
        info: &ProviderInfo,
        table: &[(Field, &[&str])],
        recipient_readback: &[&str],
    ) -> Self {
        let locators = table
            .iter()
            .map(|(field, specs)| {
                let set = LocatorSet::parse(specs).expect("built-in locator table is valid");
                (*field, set)
            })
            .collect();
        let recipient_readback = (!recipient_readback.is_empty()).then(|| {
            LocatorSet::parse(recipient_readback).expect("built-in readback table is valid")
        });

        Self {
            name: info.name.to_string(),
            display_name: info.display_name.to_string(),
            base_url: info.base_url.to_string(),
            authenticated_host: info.authenticated_host.to_string(),
            login_markers: info.login_markers.iter().map(|s| s.to_string()).collect(),
            blocked_markers: info.blocked_markers.iter().map(|s| s.to_string()).collect(),
            locators,
            recipient_readback,
            workflow: COMPOSE_WORKFLOW,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn workflow(&self) -> &'static [ActionStep] {
        self.workflow
    }

    /// Locator set for `field`.
    ///
    /// Every field of the compose workflow has an entry; a missing one is
    /// reported as a lookup failure naming no candidates.
    pub fn locators(&self, field: Field) -> Result<&LocatorSet, EngineError> {
        self.locators
            .get(&field)
            .ok_or_else(|| EngineError::ElementNotFound {
                provider: self.name.clone(),
                field,
                tried: Vec::new(),
            })
    }

    /// Replace the locator set for one field.
    pub fn with_locators(mut self, field: Field, set: LocatorSet) -> Self {
        self.locators.insert(field, set);
        self
    }

    pub fn recipient_readback(&self) -> Option<&LocatorSet> {
        self.recipient_readback.as_ref()
    }

    pub fn with_recipient_readback(mut self, set: LocatorSet) -> Self {
        self.recipient_readback = Some(set);
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Whether `url` is a login page.
    pub fn needs_login(&self, url: &str) -> bool {
        self.login_markers.iter().any(|m| url.contains(m.as_str()))
    }

    /// Whether `url` is the signed-in mail surface.
    pub fn is_authenticated(&self, url: &str) -> bool {
        url.contains(&self.authenticated_host) && !self.needs_login(url)
    }

    /// First blocked-automation marker contained in the page source.
    pub fn blocked_marker(&self, page_source: &str) -> Option<&str> {
        let source = page_source.to_lowercase();
        self.blocked_markers
            .iter()
            .find(|m| source.contains(m.as_str()))
            .map(|m| m.as_str())
    }

    pub fn summary(&self) -> ProviderSummary {
        ProviderSummary {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            url: self.base_url.clone(),
            supported: true,
        }
    }
}

/// Public listing entry for a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderSummary {
    pub name: String,
    pub display_name: String,
    pub url: String,
    pub supported: bool,
}

/// The set of providers the runtime can drive.
///
/// Read-only once built; shared across every execution.
#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    providers: Vec<Arc<ProviderSpec>>,
}

impl ProviderCatalog {
    /// Gmail and Outlook with their default locator tables.
    pub fn builtin() -> Self {
        Self {
            providers: vec![
                Arc::new(ProviderSpec::from_builtin(
                    &gmail::INFO,
                    gmail::LOCATORS,
                    gmail::RECIPIENT_READBACK,
                )),
                Arc::new(ProviderSpec::from_builtin(
                    &outlook::INFO,
                    outlook::LOCATORS,
                    outlook::RECIPIENT_READBACK,
                )),
            ],
        }
    }

    /// Build a catalog from explicit specs.
    pub fn from_specs(specs: impl IntoIterator<Item = ProviderSpec>) -> Self {
        Self {
            providers: specs.into_iter().map(Arc::new).collect(),
        }
    }

    /// Names of the built-in providers.
    pub fn builtin_names() -> [&'static str; 2] {
        [gmail::INFO.name, outlook::INFO.name]
    }

    /// Apply `[providers.<name>]` configuration overrides.
    pub fn with_overrides(
        self,
        overrides: &HashMap<String, ProviderOverride>,
    ) -> Result<Self, ConfigError> {
        let mut providers = Vec::with_capacity(self.providers.len());

        for spec in self.providers {
            let over = overrides
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(spec.name()))
                .map(|(_, o)| o);
            let Some(over) = over else {
                providers.push(spec);
                continue;
            };

            let mut spec = (*spec).clone();
            if let Some(url) = &over.base_url {
                spec = spec.with_base_url(url.clone());
            }
            if !over.recipient_readback.is_empty() {
                let set = LocatorSet::parse(&over.recipient_readback).map_err(|e| {
                    ConfigError::InvalidValue {
                        field: format!("providers.{}.recipient_readback", spec.name()),
                        message: e.to_string(),
                    }
                })?;
                spec = spec.with_recipient_readback(set);
            }
            for (field_name, specs) in &over.locators {
                let path = format!("providers.{}.locators.{}", spec.name(), field_name);
                let field = Field::from_str(field_name).map_err(|message| {
                    ConfigError::InvalidValue {
                        field: path.clone(),
                        message,
                    }
                })?;
                let set = LocatorSet::parse(specs).map_err(|e| ConfigError::InvalidValue {
                    field: path,
                    message: e.to_string(),
                })?;
                spec = spec.with_locators(field, set);
            }
            providers.push(Arc::new(spec));
        }

        for name in overrides.keys() {
            if !providers.iter().any(|p| p.name().eq_ignore_ascii_case(name)) {
                return Err(ConfigError::InvalidValue {
                    field: format!("providers.{}", name),
                    message: format!("Unknown provider '{}'", name),
                });
            }
        }

        Ok(Self { providers })
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Result<Arc<ProviderSpec>, EngineError> {
        let wanted = name.trim();
        self.providers
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
            .cloned()
            .ok_or_else(|| EngineError::UnsupportedProvider(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn summaries(&self) -> Vec<ProviderSummary> {
        self.providers.iter().map(|p| p.summary()).collect()
    }

    /// Resolve a list of requested provider names.
    ///
    /// Duplicates collapse to their first occurrence. An empty request or
    /// any unknown name fails the whole request.
    pub fn resolve_all<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<Arc<ProviderSpec>>, EngineError> {
        if names.is_empty() {
            return Err(EngineError::UnsupportedProvider(
                "no providers requested".to_string(),
            ));
        }

        let mut specs: Vec<Arc<ProviderSpec>> = Vec::with_capacity(names.len());
        for name in names {
            let spec = self.get(name.as_ref())?;
            if !specs.iter().any(|s| s.name() == spec.name()) {
                specs.push(spec);
            }
        }
        Ok(specs)
    }
}

impl Default for ProviderCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
#[path = "providers_tests.rs"]
mod tests;
