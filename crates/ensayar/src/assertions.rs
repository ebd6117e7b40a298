//! Assertion layer: expected-vs-actual over DOM state and payloads.
//!
//! Two families. DOM assertions poll over a short window, because the
//! element under assertion may not have rendered (or unrendered) yet; on
//! a stable DOM they are idempotent across repeated polls. Value
//! assertions compare scalars and structured payloads directly. Both fail
//! fast with a typed mismatch carrying the expected and actual sides —
//! the first failing assertion ends the case, never the suite.

use std::fmt::Debug;
use std::time::Duration;

use crate::config::SuiteConfig;
use crate::correlator::CorrelatedResponse;
use crate::driver::ActionDriver;
use crate::result::{EnsayarError, EnsayarResult};
use crate::selector::Selector;

/// DOM-state assertions with a polling window
#[derive(Debug, Clone)]
pub struct DomAssertions {
    driver: ActionDriver,
    window: Duration,
    poll_interval: Duration,
}

impl DomAssertions {
    /// Create DOM assertions over a driver
    #[must_use]
    pub fn new(driver: ActionDriver, config: &SuiteConfig) -> Self {
        Self {
            driver,
            window: config.assertion_timeout(),
            poll_interval: config.poll_interval(),
        }
    }

    /// Assert the element is present and visible
    pub async fn visible(&self, selector: &Selector) -> EnsayarResult<()> {
        self.poll_dom(selector, "visible", |probe| probe.found && probe.visible)
            .await
    }

    /// Assert the element is absent or not rendered
    pub async fn hidden(&self, selector: &Selector) -> EnsayarResult<()> {
        self.poll_dom(selector, "hidden", |probe| !probe.found || !probe.visible)
            .await
    }

    /// Assert the element's text content equals the expected string
    pub async fn text_equals(&self, selector: &Selector, expected: &str) -> EnsayarResult<()> {
        let probe = self
            .driver
            .wait_for_selector_within(selector, self.window)
            .await?;
        assert_equals(&probe.text.as_str(), &expected, &selector.to_string())
    }

    /// Assert at least `min` elements match
    pub async fn count_at_least(&self, selector: &Selector, min: usize) -> EnsayarResult<()> {
        let deadline = tokio::time::Instant::now() + self.window;
        let mut last = 0;
        loop {
            last = self.driver.count(selector).await.unwrap_or(last);
            if last >= min {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(EnsayarError::AssertionMismatch {
                    expected: format!(">= {min} elements"),
                    actual: format!("{last} elements"),
                    context: Some(selector.to_string()),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Assert the page URL equals the expected string.
    ///
    /// Polls, since the assertion often follows a submit whose navigation
    /// (or deliberate lack of one) is still settling.
    pub async fn url_equals(&self, expected: &str) -> EnsayarResult<()> {
        let deadline = tokio::time::Instant::now() + self.window;
        let mut last = String::new();
        loop {
            if let Ok(url) = self.driver.current_url().await {
                if url == expected {
                    return Ok(());
                }
                last = url;
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(EnsayarError::AssertionMismatch {
                    expected: expected.to_string(),
                    actual: last,
                    context: Some("page url".to_string()),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn poll_dom(
        &self,
        selector: &Selector,
        expectation: &str,
        satisfied: impl Fn(&crate::selector::ElementProbe) -> bool,
    ) -> EnsayarResult<()> {
        let deadline = tokio::time::Instant::now() + self.window;
        let mut last = String::from("absent");
        loop {
            if let Ok(probe) = self.driver.probe(selector).await {
                if satisfied(&probe) {
                    return Ok(());
                }
                last = if !probe.found {
                    "absent".to_string()
                } else if probe.visible {
                    "visible".to_string()
                } else {
                    "hidden".to_string()
                };
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(EnsayarError::AssertionMismatch {
                    expected: expectation.to_string(),
                    actual: last,
                    context: Some(selector.to_string()),
                });
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Assert two values are equal
pub fn assert_equals<T: PartialEq + Debug>(
    actual: &T,
    expected: &T,
    context: &str,
) -> EnsayarResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(EnsayarError::AssertionMismatch {
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
            context: Some(context.to_string()),
        })
    }
}

/// Assert a correlated response has a 2xx status
pub fn assert_ok(response: &CorrelatedResponse) -> EnsayarResult<()> {
    if response.ok() {
        Ok(())
    } else {
        Err(EnsayarError::AssertionMismatch {
            expected: "2xx status".to_string(),
            actual: response.status.to_string(),
            context: Some(response.url.clone()),
        })
    }
}

/// Assert JSON fields one by one.
///
/// A field missing from the payload is a mismatch, never a skip.
pub fn assert_json_fields(
    actual: &serde_json::Value,
    expected: &[(&str, serde_json::Value)],
) -> EnsayarResult<()> {
    for (field, want) in expected {
        match actual.get(field) {
            Some(got) if got == want => {}
            Some(got) => {
                return Err(EnsayarError::AssertionMismatch {
                    expected: want.to_string(),
                    actual: got.to_string(),
                    context: Some(format!("json.{field}")),
                });
            }
            None => {
                return Err(EnsayarError::AssertionMismatch {
                    expected: want.to_string(),
                    actual: "<missing field>".to_string(),
                    context: Some(format!("json.{field}")),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPage;
    use crate::selector::ElementProbe;
    use serde_json::json;
    use std::sync::Arc;

    fn dom(page: MockPage) -> DomAssertions {
        let config = SuiteConfig::default()
            .with_action_timeout(300)
            .with_assertion_timeout(200)
            .with_poll_interval(10);
        DomAssertions::new(ActionDriver::new(Arc::new(page), &config), &config)
    }

    #[tokio::test]
    async fn test_visible_and_hidden() {
        let page = MockPage::new("http://h/");
        page.insert(
            &Selector::css_with_text("nav", "All games"),
            ElementProbe::visible("All games"),
        );
        page.insert(
            &Selector::css_with_text("nav", "Logout"),
            ElementProbe::hidden("Logout"),
        );
        let dom = dom(page);
        dom.visible(&Selector::css_with_text("nav", "All games"))
            .await
            .unwrap();
        dom.hidden(&Selector::css_with_text("nav", "Logout"))
            .await
            .unwrap();
        // Absent counts as hidden too.
        dom.hidden(&Selector::css_with_text("nav", "Create Game"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_visible_fails_on_absent() {
        let page = MockPage::new("http://h/");
        let err = dom(page)
            .visible(&Selector::text("Delete"))
            .await
            .unwrap_err();
        match err {
            EnsayarError::AssertionMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, "visible");
                assert_eq!(actual, "absent");
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_idempotent_on_stable_dom() {
        let page = MockPage::new("http://h/");
        page.insert(&Selector::text("Login"), ElementProbe::visible("Login"));
        let dom = dom(page);
        for _ in 0..3 {
            dom.visible(&Selector::text("Login")).await.unwrap();
            assert!(dom.hidden(&Selector::text("Login")).await.is_err());
        }
    }

    #[tokio::test]
    async fn test_url_equals() {
        let page = MockPage::new("http://h/register");
        let dom = dom(page);
        dom.url_equals("http://h/register").await.unwrap();
        let err = dom.url_equals("http://h/").await.unwrap_err();
        assert!(matches!(err, EnsayarError::AssertionMismatch { .. }));
    }

    #[test]
    fn test_json_fields() {
        let payload = json!({
            "title": "Random title",
            "maxLevel": "777",
        });
        assert_json_fields(
            &payload,
            &[
                ("title", json!("Random title")),
                ("maxLevel", json!("777")),
            ],
        )
        .unwrap();

        let err = assert_json_fields(&payload, &[("category", json!("Random category"))])
            .unwrap_err();
        assert!(err.to_string().contains("json.category"));
        assert!(err.to_string().contains("<missing field>"));
    }

    #[test]
    fn test_assert_equals_reports_both_sides() {
        let err = assert_equals(&"Test title", &"Random title", "json.title").unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("Random title"));
        assert!(rendered.contains("Test title"));
    }

    #[test]
    fn test_assert_ok() {
        let ok = CorrelatedResponse::new("http://h/users/logout", 204, None);
        assert_ok(&ok).unwrap();
        let bad = CorrelatedResponse::new("http://h/users/login", 401, None);
        assert!(assert_ok(&bad).is_err());
    }
}
