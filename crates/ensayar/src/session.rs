//! CDP-backed session management via chromiumoxide.
//!
//! One browser process per suite, launched at suite start and reused by
//! every case. Each case gets a fresh page whose cookie state is cleared
//! before use — isolation by storage-clearing rather than full context
//! teardown, which keeps slow async cleanup off the hot path. Pages are
//! always closed per case; the count of pages opened so far is tracked
//! against the configured bound and logged once exceeded, since contexts
//! themselves are deliberately not torn down.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    ClearBrowserCookiesParams, EnableParams, EventResponseReceived, GetResponseBodyParams,
    RequestId,
};
use chromiumoxide::cdp::browser_protocol::page::CloseParams;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use tokio::sync::Mutex;

use crate::config::SuiteConfig;
use crate::host::{BodyFetcher, PageHost, Session, SessionProvider};
use crate::result::{EnsayarError, EnsayarResult};
use crate::selector::{ElementProbe, Selector};
use crate::tap::{NetworkTap, ResponseEvent};

/// Session manager owning the browser process for one suite
pub struct CdpSessionManager {
    config: SuiteConfig,
    browser: Arc<Mutex<CdpBrowser>>,
    #[allow(dead_code)]
    handler: tokio::task::JoinHandle<()>,
    pages_opened: AtomicUsize,
}

impl std::fmt::Debug for CdpSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdpSessionManager")
            .field("pages_opened", &self.pages_opened.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl CdpSessionManager {
    /// Launch the browser process.
    ///
    /// # Errors
    ///
    /// Returns a fatal `Launch` error if the automation host cannot start
    /// (binary missing, port conflict); the suite must not proceed.
    pub async fn start(config: SuiteConfig) -> EnsayarResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height);

        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder.build().map_err(|e| EnsayarError::Launch {
            message: e.to_string(),
        })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| EnsayarError::Launch {
                    message: e.to_string(),
                })?;

        // Drive the CDP connection for the lifetime of the suite.
        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        tracing::info!("browser process launched");

        Ok(Self {
            config,
            browser: Arc::new(Mutex::new(browser)),
            handler: handle,
            pages_opened: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SessionProvider for CdpSessionManager {
    async fn open_session(&self) -> EnsayarResult<Session> {
        let page = {
            let browser = self.browser.lock().await;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| EnsayarError::Session {
                    message: e.to_string(),
                })?
        };

        // Empty cookie state for the new case; no test observes another
        // test's session cookies even though contexts are reused.
        page.execute(ClearBrowserCookiesParams::default())
            .await
            .map_err(|e| EnsayarError::Session {
                message: format!("failed to clear cookies: {e}"),
            })?;

        // Network events have to be enabled before any listener sees them.
        page.execute(EnableParams::default())
            .await
            .map_err(|e| EnsayarError::Session {
                message: format!("failed to enable network events: {e}"),
            })?;

        let mut events = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| EnsayarError::Session {
                message: format!("failed to subscribe to responses: {e}"),
            })?;

        let tap = NetworkTap::new();
        let forwarder_tap = tap.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                forwarder_tap.publish(ResponseEvent::new(
                    event.request_id.inner().to_string(),
                    event.response.url.clone(),
                    event.response.status as u16,
                ));
            }
        });

        let opened = self.pages_opened.fetch_add(1, Ordering::SeqCst) + 1;
        if opened > self.config.max_open_pages {
            tracing::warn!(
                opened,
                bound = self.config.max_open_pages,
                "page count passed the configured bound; contexts are reused, not torn down"
            );
        }

        let fetcher: Arc<dyn BodyFetcher> = Arc::new(CdpBodyFetcher { page: page.clone() });
        let session = Session::new(Arc::new(CdpPageHost { page }), tap)
            .with_body_fetcher(fetcher)
            .with_forwarder(forwarder);
        tracing::debug!(session = %session.id, "session opened");
        Ok(session)
    }

    async fn close_session(&self, session: Session) -> EnsayarResult<()> {
        if let Some(forwarder) = &session.forwarder {
            forwarder.abort();
        }
        session.page.close().await?;
        tracing::debug!(session = %session.id, "session closed");
        Ok(())
    }

    async fn shutdown(&self) -> EnsayarResult<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await.map_err(|e| EnsayarError::Session {
            message: e.to_string(),
        })?;
        tracing::info!("browser process terminated");
        Ok(())
    }
}

/// Page handle backed by a CDP page
struct CdpPageHost {
    page: CdpPage,
}

impl CdpPageHost {
    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> EnsayarResult<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| EnsayarError::Eval {
                message: e.to_string(),
            })?;
        result.into_value().map_err(|e| EnsayarError::Eval {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl PageHost for CdpPageHost {
    async fn navigate(&self, url: &str) -> EnsayarResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| EnsayarError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> EnsayarResult<String> {
        let url = self.page.url().await.map_err(|e| EnsayarError::Eval {
            message: e.to_string(),
        })?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn probe(&self, selector: &Selector) -> EnsayarResult<ElementProbe> {
        self.eval(selector.to_probe_js()).await
    }

    async fn click(&self, selector: &Selector) -> EnsayarResult<bool> {
        self.eval(selector.to_click_js()).await
    }

    async fn fill(&self, selector: &Selector, value: &str) -> EnsayarResult<bool> {
        self.eval(selector.to_fill_js(value)).await
    }

    async fn count(&self, selector: &Selector) -> EnsayarResult<usize> {
        self.eval(selector.to_count_js()).await
    }

    async fn close(&self) -> EnsayarResult<()> {
        self.page
            .execute(CloseParams::default())
            .await
            .map_err(|e| EnsayarError::Session {
                message: e.to_string(),
            })?;
        Ok(())
    }
}

/// Body fetcher backed by `Network.getResponseBody`
struct CdpBodyFetcher {
    page: CdpPage,
}

#[async_trait]
impl BodyFetcher for CdpBodyFetcher {
    async fn fetch_body(&self, request_id: &str) -> EnsayarResult<Option<String>> {
        let params = GetResponseBodyParams::new(RequestId::new(request_id));
        match self.page.execute(params).await {
            Ok(response) => {
                if response.base64_encoded {
                    use base64::Engine;
                    let decoded = base64::engine::general_purpose::STANDARD
                        .decode(&response.body)
                        .map_err(|e| EnsayarError::Eval {
                            message: e.to_string(),
                        })?;
                    Ok(Some(String::from_utf8_lossy(&decoded).to_string()))
                } else {
                    Ok(Some(response.body.clone()))
                }
            }
            // The body may not be available yet; the correlator retries.
            Err(err) => {
                tracing::trace!(request_id, %err, "response body not available");
                Ok(None)
            }
        }
    }
}
