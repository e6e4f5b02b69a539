//! [`PageDriver`] over one Chrome tab.
//!
//! Element handles carry the Runtime `objectId` of the matched node, so a
//! handle keeps pointing at the same node until the page drops it.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use mailhands_protocols::{DriverError, ElementHandle, Locator, PageDriver};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cdp::{CdpClient, CdpError, PageSession, ScreenshotFormat};

/// Hides the automation flag that sign-in pages check.
const STEALTH_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

const IS_INTERACTABLE_FN: &str = r#"function() {
    if (!this.isConnected) return false;
    const style = window.getComputedStyle(this);
    if (style.visibility === 'hidden' || style.display === 'none') return false;
    const rect = this.getBoundingClientRect();
    if (rect.width === 0 || rect.height === 0) return false;
    return !this.disabled && this.getAttribute('aria-disabled') !== 'true';
}"#;

const CLEAR_FN: &str = r#"function() {
    this.focus();
    if (this.tagName === 'INPUT' || this.tagName === 'TEXTAREA') {
        this.value = '';
        this.dispatchEvent(new Event('input', { bubbles: true }));
    } else if (this.isContentEditable) {
        const range = document.createRange();
        range.selectNodeContents(this);
        const selection = window.getSelection();
        selection.removeAllRanges();
        selection.addRange(range);
        document.execCommand('delete');
    }
}"#;

const CHANGED_FN: &str = "function() { this.dispatchEvent(new Event('change', { bubbles: true })); }";

// Chip containers often show a contact name; the address lives in attributes.
const READ_VALUE_FN: &str = r#"function() {
    if (this.tagName === 'INPUT' || this.tagName === 'TEXTAREA') return this.value;
    const parts = [this.innerText || this.textContent || ''];
    const attrs = ['email', 'data-hovercard-id', 'title', 'aria-label'];
    for (const node of [this, ...this.querySelectorAll('[email], [data-hovercard-id], [title], [aria-label]')]) {
        for (const name of attrs) {
            const value = node.getAttribute(name);
            if (value && value.includes('@')) parts.push(value);
        }
    }
    return parts.join(' ');
}"#;

/// One Chrome tab.
pub struct CdpPage {
    client: Arc<CdpClient>,
    session: PageSession,
    closed: bool,
}

impl CdpPage {
    pub fn new(client: Arc<CdpClient>, session: PageSession) -> Self {
        Self {
            client,
            session,
            closed: false,
        }
    }

    pub fn target_id(&self) -> &str {
        self.session.target_id()
    }

    /// Mask automation markers before the first navigation.
    pub async fn apply_stealth(&self, user_agent: Option<&str>) -> Result<(), CdpError> {
        self.session.add_init_script(STEALTH_SCRIPT).await?;
        if let Some(ua) = user_agent {
            self.session.set_user_agent(ua).await?;
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.closed {
            Err(DriverError::Closed)
        } else {
            Ok(())
        }
    }

    async fn call_on(
        &self,
        element: &ElementHandle,
        function: &str,
    ) -> Result<Value, DriverError> {
        self.session
            .call_function_on(&element.id, function, &[])
            .await
            .map_err(|e| element_error(e, element))
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.ensure_open()?;
        self.session.navigate(url).await?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        self.ensure_open()?;
        Ok(self.session.get_url().await?)
    }

    async fn title(&mut self) -> Result<String, DriverError> {
        self.ensure_open()?;
        Ok(self.session.get_title().await?)
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        self.ensure_open()?;
        Ok(self.session.get_content().await?)
    }

    async fn find(&mut self, locator: &Locator) -> Result<Option<ElementHandle>, DriverError> {
        self.ensure_open()?;
        let object = self
            .session
            .evaluate_handle(&query_expression(&locator.css_selector()))
            .await?;

        if object.is_nullish() {
            return Ok(None);
        }
        Ok(object
            .object_id
            .map(|id| ElementHandle::new(id, locator.clone())))
    }

    async fn is_interactable(&mut self, element: &ElementHandle) -> Result<bool, DriverError> {
        self.ensure_open()?;
        let value = self.call_on(element, IS_INTERACTABLE_FN).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<(), DriverError> {
        self.ensure_open()?;
        self.session
            .scroll_into_view(&element.id)
            .await
            .map_err(|e| element_error(e, element))?;

        let model = self
            .session
            .get_box_model(&element.id)
            .await
            .map_err(|e| element_error(e, element))?
            .ok_or_else(|| DriverError::StaleElement(element.id.clone()))?;

        let (x, y) = PageSession::quad_center(&model.content);
        self.session.click(x, y).await?;
        debug!("Clicked {}", element.locator);
        Ok(())
    }

    async fn fill(&mut self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        self.ensure_open()?;
        self.call_on(element, CLEAR_FN).await?;
        self.session.type_text(text).await?;
        self.call_on(element, CHANGED_FN).await?;
        Ok(())
    }

    async fn read_value(&mut self, element: &ElementHandle) -> Result<String, DriverError> {
        self.ensure_open()?;
        let value = self.call_on(element, READ_VALUE_FN).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn screenshot_png(&mut self) -> Result<Vec<u8>, DriverError> {
        self.ensure_open()?;
        let data = self.session.screenshot(ScreenshotFormat::Png).await?;
        STANDARD
            .decode(data)
            .map_err(|e| DriverError::Script(format!("Invalid screenshot data: {}", e)))
    }

    async fn sample_elements(
        &mut self,
        tag: &str,
        limit: usize,
    ) -> Result<Vec<String>, DriverError> {
        self.ensure_open()?;
        let value = self.session.evaluate(&sample_expression(tag, limit)).await?;
        serde_json::from_value(value).map_err(|e| DriverError::Script(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        match self.client.close_page(&self.session).await {
            Ok(()) => Ok(()),
            // Nothing left to close.
            Err(CdpError::SessionClosed) => Ok(()),
            Err(_) if !self.client.is_connected() => Ok(()),
            Err(e) => {
                warn!("Failed to close tab {}: {}", self.session.target_id(), e);
                Err(e.into())
            }
        }
    }
}

/// A handle whose node is gone reads as stale; anything else maps as usual.
fn element_error(e: CdpError, element: &ElementHandle) -> DriverError {
    if e.is_stale_object() {
        DriverError::StaleElement(element.id.clone())
    } else {
        e.into()
    }
}

fn query_expression(selector: &str) -> String {
    format!("document.querySelector({})", Value::from(selector))
}

fn sample_expression(tag: &str, limit: usize) -> String {
    format!(
        "Array.from(document.getElementsByTagName({})).slice(0, {}).map(e => e.outerHTML)",
        Value::from(tag),
        limit
    )
}
