//! Ensayar: an E2E scenario engine for web applications.
//!
//! Ensayar drives a headless browser against a deployed application and
//! validates user-facing flows by asserting on DOM state and on network
//! responses correlated to the interactions that caused them. The engine
//! is the synchronization and isolation layer: browser/session lifecycle
//! with per-case isolation, race-free correlation of UI triggers with
//! asynchronous responses, and sequencing of multi-step scenarios that
//! thread fixtures across test cases.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        ENSAYAR Architecture                      │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   drives   ┌─────────────┐   mutates   ┌───────┐  │
//! │  │ Scenario  │───────────►│   Action    │────────────►│ Page  │  │
//! │  │ Sequencer │            │   Driver    │             │ (CDP) │  │
//! │  └─────┬─────┘            └─────────────┘             └───┬───┘  │
//! │        │ arm → trigger → await                            │      │
//! │        ▼                                                  ▼      │
//! │  ┌───────────┐  subscribes  ┌─────────────┐  publishes ┌──────┐  │
//! │  │ Assertion │◄─────────────│  Response   │◄───────────│ Net  │  │
//! │  │   Layer   │              │ Correlator  │            │ Tap  │  │
//! │  └───────────┘              └─────────────┘            └──────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The one ordering guarantee everything rests on: a response listener is
//! registered *before* the triggering action runs. The correlator's API
//! makes that structural — see [`correlator`].
//!
//! Real browser control via chromiumoxide is behind the `browser`
//! feature; the [`mock`] module exercises the full engine without it.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod assertions;
mod config;
mod correlator;
mod driver;
mod fixtures;
mod host;
mod report;
mod result;
mod scenario;
mod selector;
mod suite;
mod tap;

/// Browserless test doubles for the host seams
pub mod mock;

/// CDP-backed session management (requires chromium)
#[cfg(feature = "browser")]
pub mod session;

pub use assertions::{assert_equals, assert_json_fields, assert_ok, DomAssertions};
pub use config::{
    SuiteConfig, DEFAULT_ACTION_TIMEOUT_MS, DEFAULT_ASSERTION_TIMEOUT_MS,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_RESPONSE_TIMEOUT_MS,
};
pub use correlator::{ArmedResponse, CorrelatedResponse, ResponseCorrelator, ResponsePredicate};
pub use driver::ActionDriver;
pub use fixtures::{FixtureStore, UserIdentity};
pub use host::{BodyFetcher, PageHost, Session, SessionProvider};
pub use report::{CaseReport, CaseStatus, SuiteReport};
pub use result::{EnsayarError, EnsayarResult, ErrorCategory};
pub use scenario::{Phase, ScenarioContext, StepFn, TestCase};
pub use selector::{ElementProbe, Selector};
pub use suite::Suite;
pub use tap::{NetworkTap, ResponseEvent};

#[cfg(feature = "browser")]
pub use session::CdpSessionManager;

/// Re-exported so scenario steps can box their futures without naming the
/// futures crate themselves
pub use futures::future::BoxFuture;
