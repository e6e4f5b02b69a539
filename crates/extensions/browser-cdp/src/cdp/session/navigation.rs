//! Navigation operations for CDP page session.

use std::time::Duration;

use serde_json::json;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::cdp::error::CdpError;

use super::core::PageSession;

const LOAD_TIMEOUT: Duration = Duration::from_secs(30);
const LOAD_POLL: Duration = Duration::from_millis(100);

impl PageSession {
    /// Navigate to `url` and wait for the new document to load.
    pub async fn navigate(&self, url: &str) -> Result<String, CdpError> {
        let result = self
            .call("Page.navigate", Some(json!({"url": url})))
            .await?;

        if let Some(error) = result.get("errorText") {
            return Err(CdpError::NavigationFailed(
                error.as_str().unwrap_or("Unknown error").to_string(),
            ));
        }

        let frame_id = result["frameId"].as_str().unwrap_or("main").to_string();

        self.wait_for_load().await?;

        debug!("Navigated to {}", url);
        Ok(frame_id)
    }

    /// Poll `document.readyState` until the page is usable.
    pub async fn wait_for_load(&self) -> Result<(), CdpError> {
        let deadline = Instant::now() + LOAD_TIMEOUT;

        loop {
            // The old document can vanish mid-poll; keep waiting for the new one.
            match self.evaluate("document.readyState").await {
                Ok(state) => {
                    if matches!(state.as_str(), Some("complete") | Some("interactive")) {
                        return Ok(());
                    }
                }
                Err(e) if e.is_stale_object() => {}
                Err(CdpError::JavaScript(_)) => {}
                Err(e) => return Err(e),
            }

            if Instant::now() >= deadline {
                return Err(CdpError::Timeout("Page load timeout".to_string()));
            }

            sleep(LOAD_POLL).await;
        }
    }

    /// Get current URL.
    pub async fn get_url(&self) -> Result<String, CdpError> {
        let result = self.evaluate("window.location.href").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    /// Get page title.
    pub async fn get_title(&self) -> Result<String, CdpError> {
        let result = self.evaluate("document.title").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }
}
