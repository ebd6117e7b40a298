//! Browserless test doubles.
//!
//! A scripted page and session provider that implement the host seams so
//! the whole engine — driver polling, correlation, sequencing, fixtures,
//! assertions — can be exercised without Chromium. Elements are keyed by
//! the selector's display form; click effects let a test script the DOM
//! and network consequences of an interaction.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::host::{BodyFetcher, PageHost, Session, SessionProvider};
use crate::result::{EnsayarError, EnsayarResult};
use crate::selector::{ElementProbe, Selector};
use crate::tap::{NetworkTap, ResponseEvent};

/// Consequence of clicking a scripted element
#[derive(Debug, Clone)]
pub enum ClickEffect {
    /// Change the page URL
    Navigate(String),
    /// Make an element present
    Show(Selector, ElementProbe),
    /// Remove an element
    Hide(Selector),
    /// Publish a response event on the page's tap
    Publish(ResponseEvent),
}

#[derive(Debug, Clone)]
struct MockElement {
    probe: ElementProbe,
    count: usize,
    appears_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct PageState {
    url: String,
    elements: HashMap<String, MockElement>,
    effects: HashMap<String, Vec<ClickEffect>>,
    clicks: Vec<String>,
    fills: Vec<(String, String)>,
    navigations: Vec<String>,
    closed: bool,
}

/// A scripted page
#[derive(Debug, Clone)]
pub struct MockPage {
    state: Arc<Mutex<PageState>>,
    tap: Option<NetworkTap>,
}

impl MockPage {
    /// Create a page at the given URL
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(PageState {
                url: url.into(),
                ..PageState::default()
            })),
            tap: None,
        }
    }

    /// Attach the tap that `ClickEffect::Publish` fires on
    #[must_use]
    pub fn with_tap(mut self, tap: NetworkTap) -> Self {
        self.tap = Some(tap);
        self
    }

    /// Script an element as present
    pub fn insert(&self, selector: &Selector, probe: ElementProbe) {
        self.insert_many(selector, probe, 1);
    }

    /// Script an element with an explicit match count
    pub fn insert_many(&self, selector: &Selector, probe: ElementProbe, count: usize) {
        let mut state = self.state.lock().unwrap();
        state.elements.insert(
            selector.to_string(),
            MockElement {
                probe,
                count,
                appears_at: None,
            },
        );
    }

    /// Script an element that only becomes present after a delay
    pub fn appear_after(&self, selector: &Selector, probe: ElementProbe, delay: Duration) {
        let mut state = self.state.lock().unwrap();
        state.elements.insert(
            selector.to_string(),
            MockElement {
                probe,
                count: 1,
                appears_at: Some(Instant::now() + delay),
            },
        );
    }

    /// Remove a scripted element
    pub fn remove(&self, selector: &Selector) {
        let mut state = self.state.lock().unwrap();
        state.elements.remove(&selector.to_string());
    }

    /// Script what clicking an element does
    pub fn on_click(&self, selector: &Selector, effects: Vec<ClickEffect>) {
        let mut state = self.state.lock().unwrap();
        state.effects.insert(selector.to_string(), effects);
    }

    /// Selectors clicked so far, in order
    #[must_use]
    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    /// Fills performed so far, in order
    #[must_use]
    pub fn fills(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().fills.clone()
    }

    /// URLs navigated to so far
    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    /// Whether the page was closed
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    fn present(element: &MockElement) -> bool {
        element.appears_at.map_or(true, |at| Instant::now() >= at)
    }

    fn guard_open(state: &PageState) -> EnsayarResult<()> {
        if state.closed {
            return Err(EnsayarError::Session {
                message: "page is closed".to_string(),
            });
        }
        Ok(())
    }

    fn apply_effects(&self, state: &mut PageState, key: &str) {
        let Some(effects) = state.effects.get(key).cloned() else {
            return;
        };
        for effect in effects {
            match effect {
                ClickEffect::Navigate(url) => {
                    state.url = url;
                }
                ClickEffect::Show(selector, probe) => {
                    state.elements.insert(
                        selector.to_string(),
                        MockElement {
                            probe,
                            count: 1,
                            appears_at: None,
                        },
                    );
                }
                ClickEffect::Hide(selector) => {
                    state.elements.remove(&selector.to_string());
                }
                ClickEffect::Publish(event) => {
                    if let Some(tap) = &self.tap {
                        tap.publish(event);
                    }
                }
            }
        }
    }
}

#[async_trait]
impl PageHost for MockPage {
    async fn navigate(&self, url: &str) -> EnsayarResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::guard_open(&state)?;
        state.url = url.to_string();
        state.navigations.push(url.to_string());
        // A navigated document always has a body to probe.
        state.elements.insert(
            Selector::css("body").to_string(),
            MockElement {
                probe: ElementProbe::visible(""),
                count: 1,
                appears_at: None,
            },
        );
        Ok(())
    }

    async fn current_url(&self) -> EnsayarResult<String> {
        let state = self.state.lock().unwrap();
        Self::guard_open(&state)?;
        Ok(state.url.clone())
    }

    async fn probe(&self, selector: &Selector) -> EnsayarResult<ElementProbe> {
        let state = self.state.lock().unwrap();
        Self::guard_open(&state)?;
        Ok(state
            .elements
            .get(&selector.to_string())
            .filter(|el| Self::present(el))
            .map_or_else(ElementProbe::absent, |el| el.probe.clone()))
    }

    async fn click(&self, selector: &Selector) -> EnsayarResult<bool> {
        let key = selector.to_string();
        let mut state = self.state.lock().unwrap();
        Self::guard_open(&state)?;
        let clickable = state
            .elements
            .get(&key)
            .is_some_and(|el| Self::present(el));
        if !clickable {
            return Ok(false);
        }
        state.clicks.push(key.clone());
        self.apply_effects(&mut state, &key);
        Ok(true)
    }

    async fn fill(&self, selector: &Selector, value: &str) -> EnsayarResult<bool> {
        let key = selector.to_string();
        let mut state = self.state.lock().unwrap();
        Self::guard_open(&state)?;
        let present = state
            .elements
            .get(&key)
            .is_some_and(|el| Self::present(el));
        if !present {
            return Ok(false);
        }
        state.fills.push((key, value.to_string()));
        Ok(true)
    }

    async fn count(&self, selector: &Selector) -> EnsayarResult<usize> {
        let state = self.state.lock().unwrap();
        Self::guard_open(&state)?;
        Ok(state
            .elements
            .get(&selector.to_string())
            .filter(|el| Self::present(el))
            .map_or(0, |el| el.count))
    }

    async fn close(&self) -> EnsayarResult<()> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

/// Map-backed body fetcher
#[derive(Debug, Default)]
pub struct StaticBodies {
    bodies: Mutex<HashMap<String, String>>,
}

impl StaticBodies {
    /// Create an empty fetcher
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body for a request id
    pub fn insert(&self, request_id: impl Into<String>, body: impl Into<String>) {
        self.bodies
            .lock()
            .unwrap()
            .insert(request_id.into(), body.into());
    }
}

#[async_trait]
impl BodyFetcher for StaticBodies {
    async fn fetch_body(&self, request_id: &str) -> EnsayarResult<Option<String>> {
        Ok(self.bodies.lock().unwrap().get(request_id).cloned())
    }
}

type PageBuilder = dyn Fn(usize, NetworkTap) -> MockPage + Send + Sync;

/// Session provider vending scripted pages.
///
/// The builder runs once per opened session with the case index and the
/// session's tap, mirroring one-fresh-context-per-case.
pub struct MockSessionProvider {
    builder: Box<PageBuilder>,
    body_fetcher: Option<Arc<dyn BodyFetcher>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    shut_down: AtomicBool,
}

impl std::fmt::Debug for MockSessionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSessionProvider")
            .field("opened", &self.opened_count())
            .field("closed", &self.closed_count())
            .finish_non_exhaustive()
    }
}

impl MockSessionProvider {
    /// Create a provider from a page builder
    pub fn new(builder: impl Fn(usize, NetworkTap) -> MockPage + Send + Sync + 'static) -> Self {
        Self {
            builder: Box::new(builder),
            body_fetcher: None,
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Attach a body fetcher handed to every session
    #[must_use]
    pub fn with_body_fetcher(mut self, fetcher: Arc<dyn BodyFetcher>) -> Self {
        self.body_fetcher = Some(fetcher);
        self
    }

    /// Sessions opened so far
    #[must_use]
    pub fn opened_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Sessions closed so far
    #[must_use]
    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Whether shutdown was called
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for MockSessionProvider {
    async fn open_session(&self) -> EnsayarResult<Session> {
        let index = self.opened.fetch_add(1, Ordering::SeqCst);
        let tap = NetworkTap::new();
        let page = (self.builder)(index, tap.clone());
        let mut session = Session::new(Arc::new(page), tap);
        if let Some(fetcher) = &self.body_fetcher {
            session = session.with_body_fetcher(Arc::clone(fetcher));
        }
        Ok(session)
    }

    async fn close_session(&self, session: Session) -> EnsayarResult<()> {
        session.page.close().await?;
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn shutdown(&self) -> EnsayarResult<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}
