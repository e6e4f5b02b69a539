//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    /// Per-provider overrides, keyed by provider name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderOverride>,
}

/// HTTP task API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Browser launch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome remote debugging port.
    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    /// Run Chrome without a window unless a request says otherwise.
    #[serde(default)]
    pub headless: bool,

    /// Keep one profile directory across runs so manual logins stick.
    #[serde(default = "default_true")]
    pub persist_profile: bool,

    /// Profile directory. Default: <tmp>/mailhands-chrome-profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_dir: Option<PathBuf>,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Explicit Chrome executable; searched in well-known locations otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_port: default_debug_port(),
            headless: false,
            persist_profile: true,
            profile_dir: None,
            window_width: default_window_width(),
            window_height: default_window_height(),
            user_agent: None,
            chrome_path: None,
        }
    }
}

impl BrowserConfig {
    /// Profile directory, falling back to the default location.
    pub fn resolved_profile_dir(&self) -> PathBuf {
        self.profile_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("mailhands-chrome-profile"))
    }
}

fn default_debug_port() -> u16 {
    9222
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_true() -> bool {
    true
}

/// Action engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bounded wait per locator candidate.
    #[serde(default = "default_locator_timeout_ms")]
    pub locator_timeout_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Manual login window.
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,

    /// Pause after opening the compose form.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Resolve the send control but never click it.
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "default_true")]
    pub capture_snapshots: bool,

    /// Where failure screenshots and page sources are written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            locator_timeout_ms: default_locator_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            auth_timeout_secs: default_auth_timeout_secs(),
            settle_ms: default_settle_ms(),
            dry_run: false,
            capture_snapshots: true,
            diagnostics_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn locator_timeout(&self) -> Duration {
        Duration::from_millis(self.locator_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn resolved_diagnostics_dir(&self) -> PathBuf {
        self.diagnostics_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("mailhands-diagnostics"))
    }
}

fn default_locator_timeout_ms() -> u64 {
    5_000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_auth_timeout_secs() -> u64 {
    60
}

fn default_settle_ms() -> u64 {
    500
}

/// Overrides for one provider's built-in definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Field name -> ordered locator strings (`css:`, `label:`, `testid:`).
    #[serde(default)]
    pub locators: HashMap<String, Vec<String>>,

    /// Locators for the element showing accepted recipients.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipient_readback: Vec<String>,
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
