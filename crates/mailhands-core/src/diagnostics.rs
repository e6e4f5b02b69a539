//! Failure snapshots.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use mailhands_protocols::PageDriver;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Where a failed provider run stopped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureContext {
    /// Step that failed, e.g. `click_send`.
    pub step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Screenshot or page-source file, when one was captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
}

/// Receives diagnostic snapshots of a page at the moment a step fails.
#[async_trait]
pub trait DiagnosticsSink: Send + Sync {
    /// Capture the page. Returns the path of the primary artifact, if any.
    ///
    /// Must not fail: a broken snapshot never masks the original error.
    async fn capture(
        &self,
        page: &mut dyn PageDriver,
        provider: &str,
        step: &str,
    ) -> Option<PathBuf>;
}

/// Discards every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDiagnostics;

#[async_trait]
impl DiagnosticsSink for NoopDiagnostics {
    async fn capture(&self, _: &mut dyn PageDriver, _: &str, _: &str) -> Option<PathBuf> {
        None
    }
}

/// Writes `<provider>-<step>-<timestamp>.png` and `.html` into a directory.
#[derive(Debug, Clone)]
pub struct FileDiagnostics {
    dir: PathBuf,
}

impl FileDiagnostics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl DiagnosticsSink for FileDiagnostics {
    async fn capture(
        &self,
        page: &mut dyn PageDriver,
        provider: &str,
        step: &str,
    ) -> Option<PathBuf> {
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!("Cannot create diagnostics dir {}: {}", self.dir.display(), e);
            return None;
        }

        let stem = format!(
            "{}-{}-{}",
            provider,
            step,
            Utc::now().format("%Y%m%dT%H%M%S%.3f")
        );
        let mut primary = None;

        match page.screenshot_png().await {
            Ok(png) => {
                let path = self.dir.join(format!("{}.png", stem));
                match tokio::fs::write(&path, png).await {
                    Ok(()) => primary = Some(path),
                    Err(e) => warn!("Failed to write screenshot {}: {}", path.display(), e),
                }
            }
            Err(e) => debug!("Screenshot unavailable: {}", e),
        }

        match page.page_source().await {
            Ok(html) => {
                let path = self.dir.join(format!("{}.html", stem));
                match tokio::fs::write(&path, html).await {
                    Ok(()) => {
                        primary.get_or_insert(path);
                    }
                    Err(e) => warn!("Failed to write page source {}: {}", path.display(), e),
                }
            }
            Err(e) => debug!("Page source unavailable: {}", e),
        }

        primary
    }
}
