//! Network response tap.
//!
//! A broadcast fan-out of response events observed on a page. Subscribing
//! is listener registration: a receiver only ever observes events
//! published after it was created, which is exactly the happens-before
//! edge the correlator's ordering invariant needs — there is no way to
//! receive (or miss) an event from before the subscription existed.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Buffered events per subscriber before lag kicks in
const TAP_CAPACITY: usize = 256;

/// A network response observed on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEvent {
    /// Host-assigned request id, used to fetch the body on match
    pub request_id: String,
    /// Response URL
    pub url: String,
    /// HTTP status code
    pub status: u16,
}

impl ResponseEvent {
    /// Create a response event
    #[must_use]
    pub fn new(request_id: impl Into<String>, url: impl Into<String>, status: u16) -> Self {
        Self {
            request_id: request_id.into(),
            url: url.into(),
            status,
        }
    }
}

/// Fan-out of response events for one session's page
#[derive(Debug, Clone)]
pub struct NetworkTap {
    sender: broadcast::Sender<ResponseEvent>,
}

impl Default for NetworkTap {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkTap {
    /// Create a new tap
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(TAP_CAPACITY);
        Self { sender }
    }

    /// Register a listener. Must happen before the action that causes the
    /// response is triggered.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ResponseEvent> {
        self.sender.subscribe()
    }

    /// Publish an observed response to all current listeners.
    ///
    /// Events published while nobody listens are dropped, matching the
    /// wire: a response nobody registered for was never awaited.
    pub fn publish(&self, event: ResponseEvent) {
        tracing::trace!(url = %event.url, status = event.status, "response observed");
        let _ = self.sender.send(event);
    }

    /// Number of live listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
