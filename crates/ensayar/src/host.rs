//! Narrow interfaces to the external collaborators.
//!
//! The engine consumes the browser automation host through three small
//! traits: a page that answers one-shot probes and interactions, a body
//! fetcher for response payloads, and a provider that vends isolated
//! sessions. Everything that waits, retries, or times out lives above
//! these seams, which is what lets the whole engine run against the
//! `mock` module without a browser.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::result::EnsayarResult;
use crate::selector::{ElementProbe, Selector};
use crate::tap::NetworkTap;

/// A single navigable page within an isolated session.
///
/// Operations are one-shot: they observe or mutate the DOM as it is right
/// now and never block for it to settle. `click` and `fill` report whether
/// the selector resolved so the driver can keep polling on `false`.
#[async_trait]
pub trait PageHost: Send + Sync {
    /// Navigate to a URL
    async fn navigate(&self, url: &str) -> EnsayarResult<()>;

    /// Current page URL
    async fn current_url(&self) -> EnsayarResult<String>;

    /// Probe an element's presence, visibility and text
    async fn probe(&self, selector: &Selector) -> EnsayarResult<ElementProbe>;

    /// Click the element; `false` if the selector did not resolve
    async fn click(&self, selector: &Selector) -> EnsayarResult<bool>;

    /// Fill the element; `false` if the selector did not resolve
    async fn fill(&self, selector: &Selector, value: &str) -> EnsayarResult<bool>;

    /// Count matching elements
    async fn count(&self, selector: &Selector) -> EnsayarResult<usize>;

    /// Close the page
    async fn close(&self) -> EnsayarResult<()>;
}

/// Fetches a response body by CDP request id.
///
/// Separate from the tap because bodies are only fetched for the one
/// matched response, never for every event observed during the window.
#[async_trait]
pub trait BodyFetcher: Send + Sync {
    /// Fetch the body for a request id, if the host still has it
    async fn fetch_body(&self, request_id: &str) -> EnsayarResult<Option<String>>;
}

/// An isolated session: one page, its network tap, and supporting handles
pub struct Session {
    /// Session id, for logs
    pub id: Uuid,
    /// The page handle
    pub page: Arc<dyn PageHost>,
    /// Network response tap for this page
    pub tap: NetworkTap,
    /// Body fetcher for correlated responses, when the host supports it
    pub body_fetcher: Option<Arc<dyn BodyFetcher>>,
    /// Event-forwarder task, aborted when the session closes
    pub forwarder: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("has_body_fetcher", &self.body_fetcher.is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session from a page and tap, without a body fetcher
    #[must_use]
    pub fn new(page: Arc<dyn PageHost>, tap: NetworkTap) -> Self {
        Self {
            id: Uuid::new_v4(),
            page,
            tap,
            body_fetcher: None,
            forwarder: None,
        }
    }

    /// Attach a body fetcher
    #[must_use]
    pub fn with_body_fetcher(mut self, fetcher: Arc<dyn BodyFetcher>) -> Self {
        self.body_fetcher = Some(fetcher);
        self
    }

    /// Attach the event-forwarder task handle
    #[must_use]
    pub fn with_forwarder(mut self, handle: JoinHandle<()>) -> Self {
        self.forwarder = Some(handle);
        self
    }
}

/// Vends isolated sessions for a suite.
///
/// One provider per suite; one session per test case. `open_session` must
/// hand back a page with empty cookie state. `close_session` always closes
/// the page; whether the underlying context is torn down is the provider's
/// policy. `shutdown` is best-effort.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Open a fresh isolated session
    async fn open_session(&self) -> EnsayarResult<Session>;

    /// Close a session's page and release its handles
    async fn close_session(&self, session: Session) -> EnsayarResult<()>;

    /// Terminate the underlying automation host
    async fn shutdown(&self) -> EnsayarResult<()>;
}
