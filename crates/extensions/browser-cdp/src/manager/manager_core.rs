//! BrowserManager core: Chrome discovery, launch, connection and tabs.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{BrowserError, BrowserManagerConfig};
use crate::cdp::{CdpClient, PageSession};

const STARTUP_ATTEMPTS: u32 = 30;
const STARTUP_POLL: Duration = Duration::from_millis(200);

#[derive(Default)]
struct ChromeState {
    client: Option<Arc<CdpClient>>,
    /// Chrome process handle (if we launched it).
    process: Option<Child>,
    /// Whether the Chrome we talk to was started headless.
    headless: Option<bool>,
    /// Throwaway profile created for this manager.
    scratch_profile: Option<PathBuf>,
}

/// Owns the Chrome process (when it launched one) and the CDP connection.
///
/// Connection setup is serialized: concurrent tasks asking for a tab while
/// Chrome is still starting wait for the one launch.
pub struct BrowserManager {
    config: BrowserManagerConfig,
    state: Mutex<ChromeState>,
}

impl BrowserManager {
    pub fn new(config: BrowserManagerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ChromeState::default()),
        }
    }

    pub fn config(&self) -> &BrowserManagerConfig {
        &self.config
    }

    /// Find the Chrome executable: configured path first, then well-known locations.
    pub fn find_chrome(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config.chrome_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!("Configured Chrome path {} does not exist", path.display());
        }

        #[cfg(target_os = "macos")]
        let paths: &[&str] = &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ];

        #[cfg(target_os = "linux")]
        let paths: &[&str] = &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ];

        #[cfg(target_os = "windows")]
        let paths: &[&str] = &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        let paths: &[&str] = &[];

        paths.iter().map(PathBuf::from).find(|p| p.exists())
    }

    /// Check if Chrome is already answering on the debug port.
    async fn is_chrome_running(&self) -> bool {
        match reqwest::get(format!("{}/json/version", self.config.endpoint())).await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn profile_dir(&self, state: &mut ChromeState) -> PathBuf {
        if let Some(dir) = &self.config.profile_dir {
            return dir.clone();
        }
        state
            .scratch_profile
            .get_or_insert_with(|| {
                let nanos = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_nanos())
                    .unwrap_or_default();
                std::env::temp_dir().join(format!(
                    "mailhands-chrome-{}-{}",
                    std::process::id(),
                    nanos
                ))
            })
            .clone()
    }

    /// Launch Chrome with remote debugging enabled.
    async fn launch_chrome(&self, profile_dir: &Path, headless: bool) -> Result<Child, BrowserError> {
        let chrome_path = self.find_chrome().ok_or(BrowserError::ChromeNotFound)?;

        if let Err(e) = tokio::fs::create_dir_all(profile_dir).await {
            warn!("Failed to create profile directory: {}", e);
        }

        info!(
            "Launching Chrome ({}) with profile at: {}",
            if headless || self.config.headless { "headless" } else { "windowed" },
            profile_dir.display()
        );

        let child = Command::new(&chrome_path)
            .args(self.config.chrome_args(profile_dir, headless))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BrowserError::LaunchFailed(format!("{}: {}", chrome_path.display(), e)))?;

        info!("Chrome launched with PID: {:?}", child.id());
        Ok(child)
    }

    /// Connect to the browser, launching it if nothing listens on the debug port.
    pub async fn connect(&self, headless: bool) -> Result<Arc<CdpClient>, BrowserError> {
        let mut state = self.state.lock().await;

        if let Some(client) = state.client.clone() {
            if client.is_connected() {
                if state.headless.is_some_and(|h| h != (headless || self.config.headless)) {
                    debug!("Reusing running Chrome; headless preference ignored");
                }
                return Ok(client);
            }
            warn!("Lost connection to Chrome, reconnecting");
            state.client = None;
        }

        if !self.is_chrome_running().await {
            info!("Chrome not running on port {}, launching...", self.config.debug_port);

            let profile_dir = self.profile_dir(&mut state);
            let child = self.launch_chrome(&profile_dir, headless).await?;
            state.process = Some(child);
            state.headless = Some(headless || self.config.headless);

            let mut started = false;
            for _ in 0..STARTUP_ATTEMPTS {
                tokio::time::sleep(STARTUP_POLL).await;
                if self.is_chrome_running().await {
                    started = true;
                    break;
                }
            }

            if !started {
                if let Some(mut child) = state.process.take() {
                    let _ = child.kill().await;
                }
                return Err(BrowserError::LaunchFailed(
                    "Chrome failed to start within timeout".to_string(),
                ));
            }
        } else {
            info!("Chrome already running on port {}", self.config.debug_port);
        }

        let client = Arc::new(CdpClient::connect(&self.config.endpoint()).await?);
        state.client = Some(client.clone());

        info!("Connected to Chrome at {}", self.config.endpoint());
        Ok(client)
    }

    /// Open a fresh tab. The client is returned with it so the socket
    /// outlives any reconnect.
    pub async fn new_page(&self, headless: bool) -> Result<(Arc<CdpClient>, PageSession), BrowserError> {
        let client = self.connect(headless).await?;
        let session = client.new_page().await?;
        Ok((client, session))
    }

    /// Whether this manager started the Chrome process it talks to.
    pub async fn owns_process(&self) -> bool {
        self.state.lock().await.process.is_some()
    }

    /// Drop the connection, and stop Chrome if we launched it.
    pub async fn shutdown(&self) -> Result<(), BrowserError> {
        let mut state = self.state.lock().await;
        state.client = None;
        state.headless = None;

        if let Some(mut child) = state.process.take() {
            info!("Shutting down Chrome...");
            if let Err(e) = child.kill().await {
                warn!("Failed to stop Chrome: {}", e);
            }
        }

        if let Some(dir) = state.scratch_profile.take() {
            if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                debug!("Could not remove scratch profile {}: {}", dir.display(), e);
            }
        }

        Ok(())
    }
}
