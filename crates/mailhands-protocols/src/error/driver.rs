//! Browser driver errors.

use thiserror::Error;

/// Errors raised by a [`PageDriver`](crate::PageDriver) implementation.
///
/// These are low-level and carry no provider context; the engine maps them
/// onto [`EngineError`](crate::EngineError) at the step that observed them.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// The connection to the browser is gone.
    #[error("Browser session closed")]
    Closed,

    /// Transport failure talking to the browser.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The page refused or failed a navigation.
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// A script evaluated in the page threw or returned garbage.
    #[error("Script error: {0}")]
    Script(String),

    /// The referenced element is no longer attached to the page.
    #[error("Stale element: {0}")]
    StaleElement(String),

    /// The browser did not answer in time.
    #[error("Driver timeout: {0}")]
    Timeout(String),

    /// Could not start a browser session at all.
    #[error("Launch failed: {0}")]
    Launch(String),
}

impl DriverError {
    /// Whether the session behind the driver is unusable after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DriverError::Closed | DriverError::Transport(_) | DriverError::Launch(_)
        )
    }
}
