//! Application state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mailhands_core::{ProviderCoordinator, TaskRegistry};
use mailhands_protocols::IntentParser;

/// Application state shared across handlers.
pub struct AppState {
    pub registry: Arc<TaskRegistry>,
    pub parser: Arc<dyn IntentParser>,
    /// Used when a send request does not say.
    pub default_headless: bool,
    start_time: Instant,
}

impl AppState {
    pub fn new(registry: Arc<TaskRegistry>, parser: Arc<dyn IntentParser>) -> Self {
        Self {
            registry,
            parser,
            default_headless: true,
            start_time: Instant::now(),
        }
    }

    pub fn with_default_headless(mut self, headless: bool) -> Self {
        self.default_headless = headless;
        self
    }

    pub fn coordinator(&self) -> &Arc<ProviderCoordinator> {
        self.registry.coordinator()
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}
