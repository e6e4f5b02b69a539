//! In-memory page driver and launcher.
//!
//! [`FakeDom`] is a scripted page: elements keyed by locator, a URL sequence
//! for login flows, and fault injection. Tests keep a clone of the dom to
//! inspect what the engine did after handing a [`FakePage`] to it.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mailhands_protocols::{
    DriverError, ElementHandle, Field, Locator, PageDriver, SessionLauncher, SessionOptions,
};
use parking_lot::Mutex;

use crate::providers::ProviderSpec;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// A fabricated element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeElement {
    pub tag: String,
    pub visible: bool,
    pub enabled: bool,
    pub value: String,
    pub clicks: usize,
    /// Ignores `fill`, simulating an input that rejects typed text.
    pub frozen: bool,
}

impl FakeElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            visible: true,
            enabled: true,
            value: String::new(),
            clicks: 0,
            frozen: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }
}

#[derive(Default)]
struct DomState {
    elements: HashMap<String, FakeElement>,
    /// Elements that show up after a number of lookups.
    pending: HashMap<String, (usize, FakeElement)>,
    url: String,
    landing_url: Option<String>,
    url_script: VecDeque<String>,
    title: String,
    source: String,
    navigate_error: Option<DriverError>,
    navigate_delay: Option<Duration>,
    crash_after: Option<usize>,
    /// Remaining stale failures per element.
    stale: HashMap<String, usize>,
    action_errors: HashMap<String, DriverError>,
    /// Address input -> container that receives its text as a chip.
    chips: HashMap<String, String>,
    calls: usize,
    closed: bool,
    lookups: Vec<Locator>,
    actions: Vec<String>,
}

/// Shared handle to a scripted page.
#[derive(Clone, Default)]
pub struct FakeDom {
    state: Arc<Mutex<DomState>>,
}

impl FakeDom {
    pub fn new() -> Self {
        let dom = Self::default();
        dom.state.lock().url = "about:blank".to_string();
        dom
    }

    /// A signed-in page where the first candidate of every field resolves.
    pub fn for_provider(spec: &ProviderSpec) -> Self {
        let dom = Self::new();
        dom.set_landing_url(spec.base_url());
        dom.set_title(format!("Inbox - {}", spec.display_name()));
        for step in spec.workflow() {
            let Some(field) = step.field else { continue };
            if let Ok(set) = spec.locators(field) {
                let tag = match field {
                    Field::Recipient | Field::Subject => "input",
                    Field::Compose | Field::Send | Field::Body => "div",
                };
                dom.insert(&set.as_slice()[0], FakeElement::new(tag));
            }
        }
        dom
    }

    pub fn page(&self) -> FakePage {
        FakePage { dom: self.clone() }
    }

    pub fn insert(&self, locator: &Locator, element: FakeElement) {
        self.state
            .lock()
            .elements
            .insert(locator.to_string(), element);
    }

    pub fn remove(&self, locator: &Locator) {
        self.state.lock().elements.remove(&locator.to_string());
    }

    /// Make `element` findable only after `lookups` lookups of `locator`.
    pub fn appear_after(&self, locator: &Locator, lookups: usize, element: FakeElement) {
        self.state
            .lock()
            .pending
            .insert(locator.to_string(), (lookups, element));
    }

    /// URL the page shows after any navigation.
    pub fn set_landing_url(&self, url: impl Into<String>) {
        self.state.lock().landing_url = Some(url.into());
    }

    /// Successive values returned by `current_url`; the last one sticks.
    pub fn script_urls<S: Into<String>>(&self, urls: impl IntoIterator<Item = S>) {
        self.state.lock().url_script = urls.into_iter().map(Into::into).collect();
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.state.lock().title = title.into();
    }

    pub fn set_source(&self, html: impl Into<String>) {
        self.state.lock().source = html.into();
    }

    pub fn fail_navigation(&self, error: DriverError) {
        self.state.lock().navigate_error = Some(error);
    }

    pub fn delay_navigation(&self, delay: Duration) {
        self.state.lock().navigate_delay = Some(delay);
    }

    /// Every driver call after the first `calls` fails with a transport error.
    pub fn crash_after(&self, calls: usize) {
        self.state.lock().crash_after = Some(calls);
    }

    /// The next `times` clicks or fills on the element behind `locator` fail
    /// with a stale-element error.
    pub fn go_stale(&self, locator: &Locator, times: usize) {
        self.state.lock().stale.insert(locator.to_string(), times);
    }

    pub fn stale_once(&self, locator: &Locator) {
        self.go_stale(locator, 1);
    }

    /// Clicks and fills on the element behind `locator` fail with `error`.
    pub fn fail_action(&self, locator: &Locator, error: DriverError) {
        self.state
            .lock()
            .action_errors
            .insert(locator.to_string(), error);
    }

    /// Filling `input` empties it and appends the text to `container`,
    /// like an address field that turns entries into chips.
    pub fn chip_on_fill(&self, input: &Locator, container: &Locator) {
        let mut state = self.state.lock();
        state
            .elements
            .entry(container.to_string())
            .or_insert_with(|| FakeElement::new("div"));
        state
            .chips
            .insert(input.to_string(), container.to_string());
    }

    pub fn element(&self, locator: &Locator) -> Option<FakeElement> {
        self.state
            .lock()
            .elements
            .get(&locator.to_string())
            .cloned()
    }

    /// Locators passed to `find`, in call order.
    pub fn lookups(&self) -> Vec<Locator> {
        self.state.lock().lookups.clone()
    }

    /// Clicks, fills and close, in call order.
    pub fn actions(&self) -> Vec<String> {
        self.state.lock().actions.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn guard(&self) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(DriverError::Closed);
        }
        state.calls += 1;
        if let Some(limit) = state.crash_after {
            if state.calls > limit {
                return Err(DriverError::Transport("browser disconnected".to_string()));
            }
        }
        Ok(())
    }

    fn interaction_fault(&self, element: &ElementHandle) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        if let Some(remaining) = state.stale.get_mut(&element.id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DriverError::StaleElement(element.id.clone()));
            }
        }
        match state.action_errors.get(&element.id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn with_element<T>(
        &self,
        element: &ElementHandle,
        f: impl FnOnce(&mut FakeElement, &mut Vec<String>) -> T,
    ) -> Result<T, DriverError> {
        let mut state = self.state.lock();
        let DomState {
            elements, actions, ..
        } = &mut *state;
        let el = elements
            .get_mut(&element.id)
            .ok_or_else(|| DriverError::StaleElement(element.id.clone()))?;
        Ok(f(el, actions))
    }
}

/// [`PageDriver`] over a [`FakeDom`].
pub struct FakePage {
    dom: FakeDom,
}

#[async_trait]
impl PageDriver for FakePage {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.dom.guard()?;
        let delay = self.dom.state.lock().navigate_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.dom.state.lock();
        if let Some(err) = state.navigate_error.clone() {
            return Err(err);
        }
        state.url = state.landing_url.clone().unwrap_or_else(|| url.to_string());
        state.actions.push(format!("navigate {}", url));
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        self.dom.guard()?;
        let mut state = self.dom.state.lock();
        if let Some(next) = state.url_script.pop_front() {
            state.url = next;
        }
        Ok(state.url.clone())
    }

    async fn title(&mut self) -> Result<String, DriverError> {
        self.dom.guard()?;
        Ok(self.dom.state.lock().title.clone())
    }

    async fn page_source(&mut self) -> Result<String, DriverError> {
        self.dom.guard()?;
        Ok(self.dom.state.lock().source.clone())
    }

    async fn find(&mut self, locator: &Locator) -> Result<Option<ElementHandle>, DriverError> {
        self.dom.guard()?;
        let key = locator.to_string();
        let mut state = self.dom.state.lock();
        state.lookups.push(locator.clone());

        let ready = match state.pending.get_mut(&key) {
            Some((remaining, _)) => {
                *remaining = remaining.saturating_sub(1);
                *remaining == 0
            }
            None => false,
        };
        if ready {
            if let Some((_, el)) = state.pending.remove(&key) {
                state.elements.insert(key.clone(), el);
            }
        }

        Ok(state
            .elements
            .contains_key(&key)
            .then(|| ElementHandle::new(key, locator.clone())))
    }

    async fn is_interactable(&mut self, element: &ElementHandle) -> Result<bool, DriverError> {
        self.dom.guard()?;
        self.dom
            .with_element(element, |el, _| el.visible && el.enabled)
    }

    async fn click(&mut self, element: &ElementHandle) -> Result<(), DriverError> {
        self.dom.guard()?;
        self.dom.interaction_fault(element)?;
        self.dom.with_element(element, |el, actions| {
            el.clicks += 1;
            actions.push(format!("click {}", element.id));
        })
    }

    async fn fill(&mut self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        self.dom.guard()?;
        self.dom.interaction_fault(element)?;
        self.dom.with_element(element, |el, actions| {
            if !el.frozen {
                el.value = text.to_string();
            }
            actions.push(format!("fill {}", element.id));
        })?;

        let mut state = self.dom.state.lock();
        if let Some(container) = state.chips.get(&element.id).cloned() {
            if let Some(input) = state.elements.get_mut(&element.id) {
                input.value.clear();
            }
            if let Some(chips) = state.elements.get_mut(&container) {
                if !chips.value.is_empty() {
                    chips.value.push(' ');
                }
                chips.value.push_str(text);
            }
        }
        Ok(())
    }

    async fn read_value(&mut self, element: &ElementHandle) -> Result<String, DriverError> {
        self.dom.guard()?;
        self.dom.with_element(element, |el, _| el.value.clone())
    }

    async fn screenshot_png(&mut self) -> Result<Vec<u8>, DriverError> {
        self.dom.guard()?;
        Ok(PNG_MAGIC.to_vec())
    }

    async fn sample_elements(
        &mut self,
        tag: &str,
        limit: usize,
    ) -> Result<Vec<String>, DriverError> {
        self.dom.guard()?;
        let state = self.dom.state.lock();
        let mut matching: Vec<_> = state
            .elements
            .iter()
            .filter(|(_, el)| el.tag == tag)
            .map(|(key, el)| {
                format!(
                    "<{tag} data-locator=\"{key}\">{value}</{tag}>",
                    tag = el.tag,
                    key = key,
                    value = el.value
                )
            })
            .collect();
        matching.sort();
        matching.truncate(limit);
        Ok(matching)
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        let mut state = self.dom.state.lock();
        if !state.closed {
            state.closed = true;
            state.actions.push("close".to_string());
        }
        Ok(())
    }
}

/// Hands out queued [`FakeDom`] pages in order.
#[derive(Default)]
pub struct FakeLauncher {
    pages: Mutex<VecDeque<FakeDom>>,
    failure: Mutex<Option<DriverError>>,
    last_options: Mutex<Option<SessionOptions>>,
    opens: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl FakeLauncher {
    pub fn new(pages: impl IntoIterator<Item = FakeDom>) -> Self {
        Self {
            pages: Mutex::new(pages.into_iter().collect()),
            ..Default::default()
        }
    }

    /// Every `open` fails with `error`.
    pub fn failing(error: DriverError) -> Self {
        let launcher = Self::default();
        *launcher.failure.lock() = Some(error);
        launcher
    }

    pub fn push(&self, dom: FakeDom) {
        self.pages.lock().push_back(dom);
    }

    /// Number of `open` calls, successful or not.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<SessionOptions> {
        self.last_options.lock().clone()
    }
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn open(&self, options: &SessionOptions) -> Result<Box<dyn PageDriver>, DriverError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock() = Some(options.clone());
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        let dom = self
            .pages
            .lock()
            .pop_front()
            .ok_or_else(|| DriverError::Launch("no fake page queued".to_string()))?;
        Ok(Box::new(dom.page()))
    }

    async fn shutdown(&self) -> Result<(), DriverError> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
