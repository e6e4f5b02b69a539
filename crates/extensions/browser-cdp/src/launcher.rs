//! Production session launcher.

use async_trait::async_trait;
use mailhands_config::BrowserConfig;
use mailhands_protocols::{DriverError, PageDriver, SessionLauncher, SessionOptions};
use tracing::info;

use crate::manager::{BrowserManager, BrowserManagerConfig};
use crate::page::CdpPage;

/// Opens one Chrome tab per session over a shared Chrome instance.
pub struct ChromeLauncher {
    manager: BrowserManager,
}

impl ChromeLauncher {
    pub fn new(config: BrowserManagerConfig) -> Self {
        Self {
            manager: BrowserManager::new(config),
        }
    }

    pub fn from_config(config: &BrowserConfig) -> Self {
        Self::new(BrowserManagerConfig::from(config))
    }

    pub fn manager(&self) -> &BrowserManager {
        &self.manager
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    async fn open(&self, options: &SessionOptions) -> Result<Box<dyn PageDriver>, DriverError> {
        let (client, session) = self.manager.new_page(options.headless).await?;
        let mut page = CdpPage::new(client, session);

        if let Err(e) = page
            .apply_stealth(self.manager.config().user_agent.as_deref())
            .await
        {
            let _ = page.close().await;
            return Err(e.into());
        }

        info!("Opened Chrome tab {}", page.target_id());
        Ok(Box::new(page))
    }

    async fn shutdown(&self) -> Result<(), DriverError> {
        self.manager.shutdown().await?;
        Ok(())
    }
}
