//! Browser manager type definitions and configuration.

use std::path::PathBuf;

use mailhands_config::BrowserConfig;
use mailhands_protocols::DriverError;
use thiserror::Error;

use crate::cdp::CdpError;

/// Browser manager errors.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Browser not connected")]
    NotConnected,

    #[error("Chrome not found. Please install Google Chrome or set browser.chrome_path.")]
    ChromeNotFound,

    #[error("Failed to launch Chrome: {0}")]
    LaunchFailed(String),

    #[error(transparent)]
    Cdp(CdpError),
}

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::ConnectionFailed(msg) | CdpError::ChromeNotAvailable(msg) => {
                BrowserError::ConnectionFailed(msg)
            }
            CdpError::SessionClosed => BrowserError::NotConnected,
            other => BrowserError::Cdp(other),
        }
    }
}

impl From<BrowserError> for DriverError {
    fn from(e: BrowserError) -> Self {
        match e {
            BrowserError::ChromeNotFound | BrowserError::LaunchFailed(_) => {
                DriverError::Launch(e.to_string())
            }
            BrowserError::ConnectionFailed(_) => DriverError::Transport(e.to_string()),
            BrowserError::NotConnected => DriverError::Closed,
            BrowserError::Cdp(inner) => inner.into(),
        }
    }
}

/// Chrome launch settings.
#[derive(Debug, Clone)]
pub struct BrowserManagerConfig {
    /// Chrome debugging port.
    pub debug_port: u16,
    pub window_width: u32,
    pub window_height: u32,
    /// Stable profile directory; `None` gives each manager a scratch profile.
    pub profile_dir: Option<PathBuf>,
    /// Always headless, whatever a session asks for.
    pub headless: bool,
    pub user_agent: Option<String>,
    pub chrome_path: Option<PathBuf>,
}

impl Default for BrowserManagerConfig {
    fn default() -> Self {
        Self::from(&BrowserConfig::default())
    }
}

impl From<&BrowserConfig> for BrowserManagerConfig {
    fn from(config: &BrowserConfig) -> Self {
        Self {
            debug_port: config.debug_port,
            window_width: config.window_width,
            window_height: config.window_height,
            profile_dir: config
                .persist_profile
                .then(|| config.resolved_profile_dir()),
            headless: config.headless,
            user_agent: config.user_agent.clone(),
            chrome_path: config.chrome_path.clone(),
        }
    }
}

impl BrowserManagerConfig {
    /// Get the CDP endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.debug_port)
    }

    /// Command line for a Chrome instance using `profile_dir`.
    pub fn chrome_args(&self, profile_dir: &std::path::Path, headless: bool) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.debug_port),
            format!("--user-data-dir={}", profile_dir.display()),
            format!("--window-size={},{}", self.window_width, self.window_height),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-sync".to_string(),
            "--disable-translate".to_string(),
            "--metrics-recording-only".to_string(),
        ];

        if let Some(ua) = &self.user_agent {
            args.push(format!("--user-agent={}", ua));
        }

        if headless || self.headless {
            args.push("--headless=new".to_string());
        }

        args
    }
}
