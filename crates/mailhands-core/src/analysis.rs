//! DOM sampling for selector maintenance.

use std::time::Duration;

use mailhands_protocols::{DriverError, EngineError, PageDriver};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::info;

use crate::providers::ProviderSpec;

/// Samples kept per tag.
pub const SAMPLE_LIMIT: usize = 5;
/// Characters kept per sample.
pub const SAMPLE_CHARS: usize = 200;

/// Snapshot of a provider page's interactive elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomAnalysis {
    pub provider: String,
    pub title: String,
    pub url: String,
    pub buttons: Vec<String>,
    pub inputs: Vec<String>,
    pub textareas: Vec<String>,
}

/// Navigate to the provider and sample its buttons, inputs and textareas.
pub async fn analyze_page(
    page: &mut dyn PageDriver,
    spec: &ProviderSpec,
    settle: Duration,
) -> Result<DomAnalysis, EngineError> {
    info!("Analyzing DOM structure for {}", spec.display_name());
    let fail = |e: DriverError| EngineError::NavigationError {
        provider: spec.name().to_string(),
        url: spec.base_url().to_string(),
        reason: e.to_string(),
    };

    page.navigate(spec.base_url()).await.map_err(fail)?;
    if !settle.is_zero() {
        sleep(settle).await;
    }

    Ok(DomAnalysis {
        provider: spec.name().to_string(),
        title: page.title().await.map_err(fail)?,
        url: page.current_url().await.map_err(fail)?,
        buttons: sample(page, "button").await.map_err(fail)?,
        inputs: sample(page, "input").await.map_err(fail)?,
        textareas: sample(page, "textarea").await.map_err(fail)?,
    })
}

async fn sample(page: &mut dyn PageDriver, tag: &str) -> Result<Vec<String>, DriverError> {
    let samples = page.sample_elements(tag, SAMPLE_LIMIT).await?;
    Ok(samples.into_iter().map(|html| truncate(&html)).collect())
}

fn truncate(html: &str) -> String {
    html.chars().take(SAMPLE_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderCatalog;
    use crate::testing::{FakeDom, FakeElement};
    use mailhands_protocols::Locator;

    #[tokio::test(start_paused = true)]
    async fn test_analyze_samples_elements() {
        let spec = ProviderCatalog::builtin().get("outlook").unwrap();
        let dom = FakeDom::new();
        dom.set_title("Mail - Outlook");
        dom.set_landing_url("https://outlook.live.com/mail/0/");
        for i in 0..7 {
            dom.insert(&Locator::css(format!("button#b{i}")), FakeElement::new("button"));
        }
        dom.insert(
            &Locator::css("input#to"),
            FakeElement::new("input").with_value("x".repeat(500)),
        );
        let mut page = dom.page();

        let analysis = analyze_page(&mut page, &spec, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(analysis.provider, "outlook");
        assert_eq!(analysis.title, "Mail - Outlook");
        assert_eq!(analysis.url, "https://outlook.live.com/mail/0/");
        assert_eq!(analysis.buttons.len(), SAMPLE_LIMIT);
        assert_eq!(analysis.inputs.len(), 1);
        assert_eq!(analysis.inputs[0].chars().count(), SAMPLE_CHARS);
        assert!(analysis.textareas.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_navigation_failure() {
        let spec = ProviderCatalog::builtin().get("gmail").unwrap();
        let dom = FakeDom::new();
        dom.fail_navigation(DriverError::Navigation("net::ERR_INTERNET_DISCONNECTED".into()));
        let mut page = dom.page();

        let err = analyze_page(&mut page, &spec, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NavigationError { .. }));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        let html = "é".repeat(300);
        assert_eq!(truncate(&html).chars().count(), SAMPLE_CHARS);
    }
}
