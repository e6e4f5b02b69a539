//! Browser session lifecycle.

use std::fmt;
use std::sync::Arc;

use mailhands_protocols::{EngineError, PageDriver, SessionLauncher, SessionOptions};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Lifecycle states of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Ready,
    Busy,
    Closed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Failed)
    }

    fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Uninitialized, Ready)
                | (Uninitialized, Failed)
                | (Ready, Busy)
                | (Ready, Closed)
                | (Ready, Failed)
                | (Busy, Closed)
                | (Busy, Failed)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Ready => "ready",
            SessionState::Busy => "busy",
            SessionState::Closed => "closed",
            SessionState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One live browser page owned by exactly one execution.
///
/// Not `Clone`: whoever holds the `Session` (or `&mut Session`) is the only
/// one driving it.
pub struct Session {
    id: String,
    provider: String,
    state: SessionState,
    page: Option<Box<dyn PageDriver>>,
}

impl Session {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            provider: provider.into(),
            state: SessionState::Uninitialized,
            page: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) -> Result<(), EngineError> {
        if !self.state.can_transition_to(next) {
            return Err(EngineError::SessionCrashed(format!(
                "session {} cannot go from {} to {}",
                self.id, self.state, next
            )));
        }
        debug!("Session {} {} -> {}", self.id, self.state, next);
        self.state = next;
        Ok(())
    }

    /// Bind a freshly opened page.
    pub fn attach(&mut self, page: Box<dyn PageDriver>) -> Result<(), EngineError> {
        self.transition(SessionState::Ready)?;
        self.page = Some(page);
        Ok(())
    }

    /// Claim the session for an execution.
    pub fn begin(&mut self) -> Result<(), EngineError> {
        self.transition(SessionState::Busy)
    }

    /// The page, available only while the session is busy.
    pub fn page(&mut self) -> Result<&mut dyn PageDriver, EngineError> {
        if self.state != SessionState::Busy {
            return Err(EngineError::SessionCrashed(format!(
                "session {} is {}, not busy",
                self.id, self.state
            )));
        }
        match self.page.as_mut() {
            Some(page) => Ok(page.as_mut()),
            None => Err(EngineError::SessionCrashed(format!(
                "session {} has no page",
                self.id
            ))),
        }
    }

    /// Tear the page down normally.
    pub async fn close(&mut self) -> Result<(), EngineError> {
        self.transition(SessionState::Closed)?;
        if let Some(mut page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!("Closing session {} failed: {}", self.id, e);
                self.state = SessionState::Failed;
                return Err(EngineError::SessionCrashed(e.to_string()));
            }
        }
        Ok(())
    }

    /// Mark the session unusable and release the page on a best-effort basis.
    pub async fn fail(&mut self, reason: &str) {
        if self.state.is_terminal() {
            return;
        }
        warn!("Session {} for {} failed: {}", self.id, self.provider, reason);
        self.state = SessionState::Failed;
        if let Some(mut page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Ignoring close error on failed session {}: {}", self.id, e);
            }
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("state", &self.state)
            .finish()
    }
}

/// Opens sessions through a [`SessionLauncher`].
#[derive(Clone)]
pub struct SessionManager {
    launcher: Arc<dyn SessionLauncher>,
    options: SessionOptions,
}

impl SessionManager {
    pub fn new(launcher: Arc<dyn SessionLauncher>, options: SessionOptions) -> Self {
        Self { launcher, options }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Open a new, independent session for `provider`.
    pub async fn acquire(&self, provider: &str) -> Result<Session, EngineError> {
        let mut session = Session::new(provider);
        let page = self.launcher.open(&self.options).await.map_err(|e| {
            EngineError::SessionCrashed(format!("failed to open browser session: {}", e))
        })?;
        session.attach(page)?;
        info!(
            "Opened session {} for {} (headless: {})",
            session.id(),
            provider,
            self.options.headless
        );
        Ok(session)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
