//! Browser driver protocol.
//!
//! The action engine never talks to a browser directly. It drives a
//! [`PageDriver`], one live page owned by exactly one execution, obtained
//! from a [`SessionLauncher`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DriverError;
use crate::types::Locator;

/// Opaque reference to an element found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    /// Driver-specific element id.
    pub id: String,
    /// The locator that produced this handle.
    pub locator: Locator,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>, locator: Locator) -> Self {
        Self {
            id: id.into(),
            locator,
        }
    }
}

/// One live browser page.
///
/// Every method takes `&mut self`: a page is driven by a single execution
/// context at a time.
#[async_trait]
pub trait PageDriver: Send {
    /// Load `url` and wait for the document to become interactive.
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// URL the page is currently showing.
    async fn current_url(&mut self) -> Result<String, DriverError>;

    /// Document title.
    async fn title(&mut self) -> Result<String, DriverError>;

    /// Serialized document HTML.
    async fn page_source(&mut self) -> Result<String, DriverError>;

    /// Look up a single element. `Ok(None)` when nothing matches right now.
    async fn find(&mut self, locator: &Locator) -> Result<Option<ElementHandle>, DriverError>;

    /// Whether the element is visible and enabled.
    async fn is_interactable(&mut self, element: &ElementHandle) -> Result<bool, DriverError>;

    async fn click(&mut self, element: &ElementHandle) -> Result<(), DriverError>;

    /// Replace the element's content with `text`. Never appends.
    async fn fill(&mut self, element: &ElementHandle, text: &str) -> Result<(), DriverError>;

    /// Current text value of an input or editable element. For other
    /// elements, their text plus any email addresses carried in attributes.
    async fn read_value(&mut self, element: &ElementHandle) -> Result<String, DriverError>;

    /// PNG screenshot of the viewport.
    async fn screenshot_png(&mut self) -> Result<Vec<u8>, DriverError>;

    /// `outerHTML` of the first `limit` elements with the given tag name.
    async fn sample_elements(&mut self, tag: &str, limit: usize)
    -> Result<Vec<String>, DriverError>;

    /// Tear the page down. Further calls fail with [`DriverError::Closed`].
    async fn close(&mut self) -> Result<(), DriverError>;
}

/// Options applied when a task opens its sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Run the browser without a visible window.
    #[serde(default)]
    pub headless: bool,
}

impl SessionOptions {
    pub fn headless(headless: bool) -> Self {
        Self { headless }
    }
}

/// Opens fresh pages. Each call yields an independent page.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn open(&self, options: &SessionOptions) -> Result<Box<dyn PageDriver>, DriverError>;

    /// Release any browser process owned by the launcher.
    async fn shutdown(&self) -> Result<(), DriverError> {
        Ok(())
    }
}
