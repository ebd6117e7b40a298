//! Response correlation: tying one network response to one user action.
//!
//! The whole correctness of a network-asserting test rests on a single
//! ordering guarantee: the response listener must exist before the action
//! that causes the response is triggered. The API makes that ordering
//! structural — `arm` returns the token that `wait` consumes, so there is
//! no way to await a correlation that was not armed first, and
//! [`ResponseCorrelator::correlate`] runs arm → trigger → wait as one
//! step from the caller's perspective.
//!
//! Responses that land while the trigger is still running are buffered by
//! the armed subscription; "first match" is deterministic by arrival
//! order on the tap.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::host::BodyFetcher;
use crate::result::{EnsayarError, EnsayarResult};
use crate::tap::{NetworkTap, ResponseEvent};

/// Attempts to fetch a matched response's body before giving up
const BODY_FETCH_ATTEMPTS: u32 = 5;

/// Delay between body fetch attempts
const BODY_FETCH_DELAY: Duration = Duration::from_millis(100);

/// Predicate over observed responses: URL substring + expected status.
///
/// Pure by construction — it owns only the two values it compares
/// against, and `matches` reads nothing else. It runs once per response
/// observed during the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePredicate {
    /// Substring the response URL must contain
    pub url_contains: String,
    /// Exact status code the response must carry
    pub status: u16,
}

impl ResponsePredicate {
    /// Create a predicate
    #[must_use]
    pub fn new(url_contains: impl Into<String>, status: u16) -> Self {
        Self {
            url_contains: url_contains.into(),
            status,
        }
    }

    /// Whether a response matches
    #[must_use]
    pub fn matches(&self, url: &str, status: u16) -> bool {
        status == self.status && url.contains(&self.url_contains)
    }
}

impl std::fmt::Display for ResponsePredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "url~\"{}\" status={}", self.url_contains, self.status)
    }
}

/// A response matched to a predicate and tied to one triggering action.
///
/// Ephemeral: captured once per network-awaiting action, consumed by the
/// assertion layer, never persisted beyond the step that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelatedResponse {
    /// Response URL
    pub url: String,
    /// HTTP status code
    pub status: u16,
    body: Option<String>,
}

impl CorrelatedResponse {
    /// Create a correlated response
    #[must_use]
    pub fn new(url: impl Into<String>, status: u16, body: Option<String>) -> Self {
        Self {
            url: url.into(),
            status,
            body,
        }
    }

    /// Whether the status is a success (2xx)
    #[must_use]
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Raw body, if the host could still produce it
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Parse the body as JSON
    pub fn json(&self) -> EnsayarResult<serde_json::Value> {
        let body = self.body.as_deref().ok_or_else(|| EnsayarError::Eval {
            message: format!("correlated response for {} has no body", self.url),
        })?;
        Ok(serde_json::from_str(body)?)
    }
}

/// An armed correlation: the listener exists, the trigger may now run.
///
/// Holding this token *is* the registration; dropping it unregisters.
pub struct ArmedResponse {
    receiver: broadcast::Receiver<ResponseEvent>,
    predicate: ResponsePredicate,
    body_fetcher: Option<Arc<dyn BodyFetcher>>,
    timeout: Duration,
}

impl std::fmt::Debug for ArmedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmedResponse")
            .field("predicate", &self.predicate)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ArmedResponse {
    /// Await the first response matching the predicate, in tap arrival
    /// order, then fetch its body.
    ///
    /// # Errors
    ///
    /// `ResponseTimeout` if nothing matches within the window; `Session`
    /// if the tap closed underneath the wait.
    pub async fn wait(mut self) -> EnsayarResult<CorrelatedResponse> {
        let predicate = self.predicate.clone();
        let recv_loop = async {
            loop {
                match self.receiver.recv().await {
                    Ok(event) if predicate.matches(&event.url, event.status) => {
                        return Ok(event);
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "response tap lagged while waiting");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(EnsayarError::Session {
                            message: "network tap closed while awaiting response".to_string(),
                        });
                    }
                }
            }
        };

        let event = match tokio::time::timeout(self.timeout, recv_loop).await {
            Ok(Ok(event)) => event,
            Ok(Err(err)) => return Err(err),
            Err(_) => {
                return Err(EnsayarError::ResponseTimeout {
                    pattern: predicate.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        };

        tracing::debug!(url = %event.url, status = event.status, "response correlated");

        let body = match self.body_fetcher {
            Some(fetcher) => fetch_body_with_retry(fetcher.as_ref(), &event.request_id).await,
            None => None,
        };
        Ok(CorrelatedResponse::new(event.url, event.status, body))
    }
}

/// Bodies can trail the response event on the wire, so retry briefly and
/// degrade to a body-less response rather than failing the correlation.
async fn fetch_body_with_retry(fetcher: &dyn BodyFetcher, request_id: &str) -> Option<String> {
    for attempt in 0..BODY_FETCH_ATTEMPTS {
        match fetcher.fetch_body(request_id).await {
            Ok(Some(body)) => return Some(body),
            Ok(None) => {}
            Err(err) => {
                tracing::debug!(attempt, %err, "body fetch attempt failed");
            }
        }
        tokio::time::sleep(BODY_FETCH_DELAY).await;
    }
    tracing::warn!(request_id, "giving up on response body");
    None
}

/// The correlator for one session's page
#[derive(Clone)]
pub struct ResponseCorrelator {
    tap: NetworkTap,
    body_fetcher: Option<Arc<dyn BodyFetcher>>,
    timeout: Duration,
}

impl std::fmt::Debug for ResponseCorrelator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCorrelator")
            .field("timeout", &self.timeout)
            .field("has_body_fetcher", &self.body_fetcher.is_some())
            .finish()
    }
}

impl ResponseCorrelator {
    /// Create a correlator over a tap
    #[must_use]
    pub fn new(
        tap: NetworkTap,
        body_fetcher: Option<Arc<dyn BodyFetcher>>,
        timeout: Duration,
    ) -> Self {
        Self {
            tap,
            body_fetcher,
            timeout,
        }
    }

    /// Register a listener for the predicate. Happens-before any trigger
    /// the caller runs afterwards.
    #[must_use]
    pub fn arm(&self, predicate: ResponsePredicate) -> ArmedResponse {
        tracing::debug!(%predicate, "armed response listener");
        ArmedResponse {
            receiver: self.tap.subscribe(),
            predicate,
            body_fetcher: self.body_fetcher.clone(),
            timeout: self.timeout,
        }
    }

    /// Arm, trigger, await — the single atomic step scenario code uses.
    ///
    /// The listener is registered before `trigger` starts executing; a
    /// response racing the trigger's completion is buffered and found by
    /// the wait.
    pub async fn correlate<F>(
        &self,
        predicate: ResponsePredicate,
        trigger: F,
    ) -> EnsayarResult<CorrelatedResponse>
    where
        F: std::future::Future<Output = EnsayarResult<()>> + Send,
    {
        let armed = self.arm(predicate);
        trigger.await?;
        armed.wait().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tap::ResponseEvent;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct MapFetcher(HashMap<String, String>);

    #[async_trait]
    impl BodyFetcher for MapFetcher {
        async fn fetch_body(&self, request_id: &str) -> EnsayarResult<Option<String>> {
            Ok(self.0.get(request_id).cloned())
        }
    }

    fn correlator(tap: &NetworkTap) -> ResponseCorrelator {
        ResponseCorrelator::new(tap.clone(), None, Duration::from_millis(200))
    }

    mod predicate_tests {
        use super::*;

        #[test]
        fn test_matches_substring_and_status() {
            let p = ResponsePredicate::new("/users/register", 200);
            assert!(p.matches("http://localhost:3002/users/register", 200));
            assert!(!p.matches("http://localhost:3002/users/register", 400));
            assert!(!p.matches("http://localhost:3002/users/login", 200));
        }

        #[test]
        fn test_repeated_invocation_is_stable() {
            let p = ResponsePredicate::new("/data/games", 200);
            for _ in 0..100 {
                assert!(p.matches("http://h/data/games/7", 200));
            }
        }

        #[test]
        fn test_display() {
            let p = ResponsePredicate::new("/users/logout", 204);
            assert_eq!(p.to_string(), "url~\"/users/logout\" status=204");
        }
    }

    mod correlation_tests {
        use super::*;

        #[tokio::test]
        async fn test_arm_before_publish_catches() {
            let tap = NetworkTap::new();
            let armed = correlator(&tap).arm(ResponsePredicate::new("/users/register", 200));
            tap.publish(ResponseEvent::new("r1", "http://h/users/register", 200));
            let response = armed.wait().await.unwrap();
            assert_eq!(response.status, 200);
            assert!(response.ok());
        }

        #[tokio::test]
        async fn test_publish_before_arm_times_out() {
            let tap = NetworkTap::new();
            // The response fires before any listener exists: the classic
            // trigger-then-listen bug. It must surface as a timeout, not a
            // hang and not a phantom match.
            tap.publish(ResponseEvent::new("r1", "http://h/users/register", 200));
            let armed = correlator(&tap).arm(ResponsePredicate::new("/users/register", 200));
            let err = armed.wait().await.unwrap_err();
            assert!(matches!(err, EnsayarError::ResponseTimeout { .. }));
        }

        #[tokio::test]
        async fn test_non_matching_events_are_skipped() {
            let tap = NetworkTap::new();
            let armed = correlator(&tap).arm(ResponsePredicate::new("/users/login", 200));
            tap.publish(ResponseEvent::new("r1", "http://h/styles.css", 200));
            tap.publish(ResponseEvent::new("r2", "http://h/users/login", 401));
            tap.publish(ResponseEvent::new("r3", "http://h/users/login", 200));
            let response = armed.wait().await.unwrap();
            assert_eq!(response.url, "http://h/users/login");
            assert_eq!(response.status, 200);
        }

        #[tokio::test]
        async fn test_first_match_wins_by_arrival_order() {
            let tap = NetworkTap::new();
            let armed = correlator(&tap).arm(ResponsePredicate::new("/data/games", 200));
            tap.publish(ResponseEvent::new("first", "http://h/data/games?page=1", 200));
            tap.publish(ResponseEvent::new("second", "http://h/data/games?page=2", 200));
            let response = armed.wait().await.unwrap();
            assert_eq!(response.url, "http://h/data/games?page=1");
        }

        #[tokio::test]
        async fn test_correlate_buffers_response_during_trigger() {
            let tap = NetworkTap::new();
            let publisher = tap.clone();
            // The "server" answers before the trigger future finishes,
            // the shape of the race the two-phase design removes.
            let response = correlator(&tap)
                .correlate(ResponsePredicate::new("/users/logout", 204), async move {
                    publisher.publish(ResponseEvent::new("r1", "http://h/users/logout", 204));
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(())
                })
                .await
                .unwrap();
            assert_eq!(response.status, 204);
        }

        #[tokio::test]
        async fn test_trigger_error_propagates() {
            let tap = NetworkTap::new();
            let err = correlator(&tap)
                .correlate(ResponsePredicate::new("/users/login", 200), async {
                    Err(EnsayarError::ElementNotFound {
                        selector: "css=[type=\"submit\"]".to_string(),
                        timeout_ms: 100,
                    })
                })
                .await
                .unwrap_err();
            assert!(matches!(err, EnsayarError::ElementNotFound { .. }));
        }

        #[tokio::test]
        async fn test_body_fetched_on_match() {
            let tap = NetworkTap::new();
            let mut bodies = HashMap::new();
            bodies.insert(
                "r9".to_string(),
                r#"{"email":"abv@abv.bg","password":"123456"}"#.to_string(),
            );
            let fetcher: Arc<dyn BodyFetcher> = Arc::new(MapFetcher(bodies));
            let correlator = ResponseCorrelator::new(
                tap.clone(),
                Some(fetcher),
                Duration::from_millis(200),
            );
            let armed = correlator.arm(ResponsePredicate::new("/users/register", 200));
            tap.publish(ResponseEvent::new("r9", "http://h/users/register", 200));
            let response = armed.wait().await.unwrap();
            let json = response.json().unwrap();
            assert_eq!(json["email"], "abv@abv.bg");
        }

        #[tokio::test]
        async fn test_json_without_body_is_an_error() {
            let response = CorrelatedResponse::new("http://h/users/logout", 204, None);
            assert!(response.ok());
            assert!(response.json().is_err());
        }
    }
}
