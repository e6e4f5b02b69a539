//! Wiring from configuration to a ready coordinator.

use std::path::Path;
use std::sync::Arc;

use mailhands_browser_cdp::ChromeLauncher;
use mailhands_config::{Config, ConfigError, ConfigLoader, ConfigValidator};
use mailhands_core::{
    DiagnosticsSink, ExecutionContext, ExecutorConfig, FileDiagnostics, NoopDiagnostics,
    ProviderCatalog, ProviderCoordinator,
};
use mailhands_protocols::SessionLauncher;
use tracing::{debug, warn};

/// Load and validate configuration. Validation warnings are logged.
pub(crate) fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = ConfigLoader::load_or_default(path)?;
    let warnings =
        ConfigValidator::validate(&config, &ProviderCatalog::builtin_names())?.into_result()?;
    for warning in warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    Ok(config)
}

/// Coordinator plus the pieces it was built from.
pub(crate) struct Engine {
    pub coordinator: Arc<ProviderCoordinator>,
    pub diagnostics: Arc<dyn DiagnosticsSink>,
}

impl Engine {
    /// Production engine driving Chrome.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let catalog = ProviderCatalog::builtin().with_overrides(&config.providers)?;
        let launcher = Arc::new(ChromeLauncher::from_config(&config.browser));
        Ok(Self::new(catalog, launcher, config))
    }

    pub fn new(catalog: ProviderCatalog, launcher: Arc<dyn SessionLauncher>, config: &Config) -> Self {
        let diagnostics: Arc<dyn DiagnosticsSink> = if config.engine.capture_snapshots {
            Arc::new(FileDiagnostics::new(config.engine.resolved_diagnostics_dir()))
        } else {
            Arc::new(NoopDiagnostics)
        };
        let coordinator = ProviderCoordinator::new(
            Arc::new(catalog),
            launcher,
            ExecutorConfig::from(&config.engine),
        );
        Self {
            coordinator: Arc::new(coordinator),
            diagnostics,
        }
    }

    pub fn context(&self, task_id: impl Into<String>) -> ExecutionContext {
        ExecutionContext::new(task_id, self.diagnostics.clone())
    }

    /// Release the browser. Errors are logged, never returned.
    pub async fn shutdown(&self) {
        match self.coordinator.launcher().shutdown().await {
            Ok(()) => debug!("Browser released"),
            Err(e) => warn!("Browser shutdown failed: {}", e),
        }
    }
}
