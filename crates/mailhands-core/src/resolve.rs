//! Locator resolution with bounded waits.

use std::time::Duration;

use mailhands_protocols::{
    DriverError, ElementHandle, EngineError, Field, Locator, LocatorSet, PageDriver,
};
use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

/// Per-candidate wait bounds.
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Find the first interactable element for `field`.
///
/// Candidates are tried in declared order, each with its own bounded wait.
/// Fatal driver errors abort resolution with `SessionCrashed`; transient
/// ones are logged and the wait continues.
pub async fn resolve(
    page: &mut dyn PageDriver,
    provider: &str,
    field: Field,
    locators: &LocatorSet,
    policy: WaitPolicy,
) -> Result<ElementHandle, EngineError> {
    let mut tried = Vec::with_capacity(locators.len());

    for locator in locators {
        tried.push(locator.clone());
        match wait_for_interactable(page, locator, policy).await {
            Ok(Some(element)) => {
                debug!(
                    "Resolved {}/{} with {} (candidate {} of {})",
                    provider,
                    field,
                    locator,
                    tried.len(),
                    locators.len()
                );
                return Ok(element);
            }
            Ok(None) => {
                debug!("{}/{}: {} did not become interactable", provider, field, locator);
            }
            Err(e) => return Err(EngineError::SessionCrashed(e.to_string())),
        }
    }

    Err(EngineError::ElementNotFound {
        provider: provider.to_string(),
        field,
        tried,
    })
}

/// Poll one locator until it yields an interactable element or the bound expires.
async fn wait_for_interactable(
    page: &mut dyn PageDriver,
    locator: &Locator,
    policy: WaitPolicy,
) -> Result<Option<ElementHandle>, DriverError> {
    let deadline = Instant::now() + policy.timeout;

    loop {
        match try_locator(page, locator).await {
            Ok(Some(element)) => return Ok(Some(element)),
            Ok(None) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => trace!("Transient error probing {}: {}", locator, e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        sleep(policy.poll_interval.min(deadline - now)).await;
    }
}

async fn try_locator(
    page: &mut dyn PageDriver,
    locator: &Locator,
) -> Result<Option<ElementHandle>, DriverError> {
    let Some(element) = page.find(locator).await? else {
        return Ok(None);
    };
    if page.is_interactable(&element).await? {
        Ok(Some(element))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
