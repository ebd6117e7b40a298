//! Action driver: polling primitives over a page.
//!
//! Every primitive here is a suspension point: it suspends the calling
//! scenario step until the DOM reaches the requested state or its window
//! elapses. Selectors are resolved against a live, possibly still
//! rendering DOM, so a first miss means "poll again", never "fail". Only
//! an exhausted window produces [`EnsayarError::ElementNotFound`], which
//! propagates as a test case failure.

use std::sync::Arc;
use std::time::Duration;

use crate::config::SuiteConfig;
use crate::host::PageHost;
use crate::result::{EnsayarError, EnsayarResult};
use crate::selector::{ElementProbe, Selector};

/// Simulated user interactions against one page
#[derive(Clone)]
pub struct ActionDriver {
    page: Arc<dyn PageHost>,
    timeout: Duration,
    poll_interval: Duration,
}

impl std::fmt::Debug for ActionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDriver")
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl ActionDriver {
    /// Create a driver over a page using the suite's timing configuration
    #[must_use]
    pub fn new(page: Arc<dyn PageHost>, config: &SuiteConfig) -> Self {
        Self {
            page,
            timeout: config.action_timeout(),
            poll_interval: config.poll_interval(),
        }
    }

    /// The underlying page handle
    #[must_use]
    pub fn page(&self) -> &Arc<dyn PageHost> {
        &self.page
    }

    /// Navigate and wait for the document to become probe-able
    pub async fn navigate(&self, url: &str) -> EnsayarResult<()> {
        tracing::debug!(url, "navigate");
        self.page.navigate(url).await?;
        let body = Selector::css("body");
        self.wait_for_selector(&body).await.map_err(|_| {
            EnsayarError::Navigation {
                url: url.to_string(),
                message: "document never became ready".to_string(),
            }
        })?;
        Ok(())
    }

    /// Click the element once the selector resolves
    pub async fn click(&self, selector: &Selector) -> EnsayarResult<()> {
        tracing::debug!(%selector, "click");
        let page = Arc::clone(&self.page);
        self.poll(self.timeout, selector, move |sel| {
            let page = Arc::clone(&page);
            let sel = sel.clone();
            async move { Ok(page.click(&sel).await?.then_some(())) }
        })
        .await
    }

    /// Fill the element once the selector resolves
    pub async fn fill(&self, selector: &Selector, value: &str) -> EnsayarResult<()> {
        tracing::debug!(%selector, "fill");
        let page = Arc::clone(&self.page);
        let value = value.to_string();
        self.poll(self.timeout, selector, move |sel| {
            let page = Arc::clone(&page);
            let sel = sel.clone();
            let value = value.clone();
            async move { Ok(page.fill(&sel, &value).await?.then_some(())) }
        })
        .await
    }

    /// Wait until the selector resolves to a present element
    pub async fn wait_for_selector(&self, selector: &Selector) -> EnsayarResult<ElementProbe> {
        self.wait_for_selector_within(selector, self.timeout).await
    }

    /// Wait until the selector resolves, with an explicit window
    pub async fn wait_for_selector_within(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> EnsayarResult<ElementProbe> {
        let page = Arc::clone(&self.page);
        self.poll(timeout, selector, move |sel| {
            let page = Arc::clone(&page);
            let sel = sel.clone();
            async move {
                let probe = page.probe(&sel).await?;
                Ok(probe.found.then_some(probe))
            }
        })
        .await
    }

    /// Wait until some element's own text contains the needle
    pub async fn wait_for_text(&self, text: &str) -> EnsayarResult<ElementProbe> {
        self.wait_for_selector(&Selector::text(text)).await
    }

    /// Current page URL
    pub async fn current_url(&self) -> EnsayarResult<String> {
        self.page.current_url().await
    }

    /// Count matching elements right now, without waiting
    pub async fn count(&self, selector: &Selector) -> EnsayarResult<usize> {
        self.page.count(selector).await
    }

    /// Wait for the selector and return its text content
    pub async fn text_of(&self, selector: &Selector) -> EnsayarResult<String> {
        let probe = self.wait_for_selector(selector).await?;
        Ok(probe.text)
    }

    /// One-shot probe, no waiting. The assertion layer runs its own
    /// polling window on top of this.
    pub async fn probe(&self, selector: &Selector) -> EnsayarResult<ElementProbe> {
        self.page.probe(selector).await
    }

    /// Poll `op` until it yields a value or the window elapses.
    ///
    /// Probe errors inside the loop are treated as transient (the page may
    /// be mid-navigation) and only logged; exhaustion converts to a typed
    /// `ElementNotFound` carrying the selector and the window.
    async fn poll<T, F, Fut>(
        &self,
        timeout: Duration,
        selector: &Selector,
        op: F,
    ) -> EnsayarResult<T>
    where
        F: Fn(&Selector) -> Fut,
        Fut: std::future::Future<Output = EnsayarResult<Option<T>>>,
    {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match op(selector).await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(err) => {
                    tracing::trace!(%selector, %err, "transient probe failure");
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(EnsayarError::ElementNotFound {
                    selector: selector.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPage;
    use crate::selector::Selector;

    fn driver(page: MockPage) -> ActionDriver {
        let config = SuiteConfig::default()
            .with_action_timeout(400)
            .with_poll_interval(10);
        ActionDriver::new(Arc::new(page), &config)
    }

    #[tokio::test]
    async fn test_click_resolves_immediately() {
        let page = MockPage::new("http://h/");
        page.insert(&Selector::text("Register"), ElementProbe::visible("Register"));
        let driver = driver(page.clone());
        driver.click(&Selector::text("Register")).await.unwrap();
        assert_eq!(page.clicks(), vec!["text=Register".to_string()]);
    }

    #[tokio::test]
    async fn test_wait_tolerates_transient_absence() {
        let page = MockPage::new("http://h/register");
        page.appear_after(
            &Selector::css("form"),
            ElementProbe::visible(""),
            Duration::from_millis(100),
        );
        let driver = driver(page);
        let probe = driver.wait_for_selector(&Selector::css("form")).await.unwrap();
        assert!(probe.found);
    }

    #[tokio::test]
    async fn test_missing_element_is_typed_failure() {
        let page = MockPage::new("http://h/");
        let driver = driver(page);
        let err = driver.click(&Selector::text("Nope")).await.unwrap_err();
        match err {
            EnsayarError::ElementNotFound {
                selector,
                timeout_ms,
            } => {
                assert_eq!(selector, "text=Nope");
                assert_eq!(timeout_ms, 400);
            }
            other => panic!("expected ElementNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fill_records_value() {
        let page = MockPage::new("http://h/register");
        page.insert(&Selector::css("#email"), ElementProbe::visible(""));
        let driver = driver(page.clone());
        driver
            .fill(&Selector::css("#email"), "abv@abv.bg")
            .await
            .unwrap();
        assert_eq!(
            page.fills(),
            vec![("css=#email".to_string(), "abv@abv.bg".to_string())]
        );
    }

    #[tokio::test]
    async fn test_text_of() {
        let page = MockPage::new("http://h/");
        page.insert(
            &Selector::css(".welcome-message h2"),
            ElementProbe::visible("ALL new games are"),
        );
        let driver = driver(page);
        let text = driver
            .text_of(&Selector::css(".welcome-message h2"))
            .await
            .unwrap();
        assert_eq!(text, "ALL new games are");
    }
}
