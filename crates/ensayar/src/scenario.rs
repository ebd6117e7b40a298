//! Scenario sequencing: Arrange / Act / Assert test cases.
//!
//! A test case moves through `Pending → Arranging → Acting → Asserting →
//! Passed|Failed`. Arranging failures are reported as setup failures,
//! distinct from assertion failures; acting and asserting errors keep
//! their own categories. Cases declare the fixtures they consume and
//! produce, which is what lets the suite runner enforce ordering
//! explicitly instead of relying on implicit script order.

use futures::future::BoxFuture;

use crate::assertions::DomAssertions;
use crate::config::SuiteConfig;
use crate::correlator::{CorrelatedResponse, ResponseCorrelator, ResponsePredicate};
use crate::driver::ActionDriver;
use crate::fixtures::FixtureStore;
use crate::host::Session;
use crate::result::{EnsayarError, EnsayarResult};
use crate::selector::Selector;

/// Phase of a test case's state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    /// Not started
    Pending,
    /// Navigation and precondition setup
    Arranging,
    /// The behavior under test
    Acting,
    /// Expected-vs-actual evaluation
    Asserting,
    /// Terminal: every step succeeded
    Passed,
    /// Terminal: a step failed
    Failed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Arranging => "arranging",
            Self::Acting => "acting",
            Self::Asserting => "asserting",
            Self::Passed => "passed",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Everything a scenario step can touch
pub struct ScenarioContext {
    /// Action driver for the case's page
    pub driver: ActionDriver,
    /// Response correlator for the case's page
    pub correlator: ResponseCorrelator,
    /// DOM assertions over the same page
    pub dom: DomAssertions,
    /// Suite-scoped fixture store
    pub fixtures: FixtureStore,
    /// Suite configuration
    pub config: SuiteConfig,
    last_response: Option<CorrelatedResponse>,
}

impl std::fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("has_last_response", &self.last_response.is_some())
            .finish_non_exhaustive()
    }
}

impl ScenarioContext {
    /// Build a context over one session
    #[must_use]
    pub fn from_session(session: &Session, config: &SuiteConfig, fixtures: FixtureStore) -> Self {
        let driver = ActionDriver::new(std::sync::Arc::clone(&session.page), config);
        let correlator = ResponseCorrelator::new(
            session.tap.clone(),
            session.body_fetcher.clone(),
            config.response_timeout(),
        );
        let dom = DomAssertions::new(driver.clone(), config);
        Self {
            driver,
            correlator,
            dom,
            fixtures,
            config: config.clone(),
            last_response: None,
        }
    }

    /// Join a path onto the suite's base URL
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        self.config.url(path)
    }

    /// Arm for the predicate, click the selector, await the match — the
    /// register → trigger → await sequence as one step. The correlated
    /// response is kept for the asserting phase of this case only.
    pub async fn correlate_click(
        &mut self,
        predicate: ResponsePredicate,
        selector: &Selector,
    ) -> EnsayarResult<&CorrelatedResponse> {
        let driver = self.driver.clone();
        let selector = selector.clone();
        let response = self
            .correlator
            .correlate(predicate, async move { driver.click(&selector).await })
            .await?;
        self.last_response = Some(response);
        Ok(self.last_response.as_ref().unwrap())
    }

    /// Keep a correlated response for the asserting phase
    pub fn keep_response(&mut self, response: CorrelatedResponse) {
        self.last_response = Some(response);
    }

    /// The response captured by the acting phase
    pub fn last_response(&self) -> EnsayarResult<&CorrelatedResponse> {
        self.last_response.as_ref().ok_or_else(|| EnsayarError::Eval {
            message: "no correlated response was captured by the acting phase".to_string(),
        })
    }
}

/// A boxed async step over the scenario context
pub type StepFn =
    Box<dyn for<'a> Fn(&'a mut ScenarioContext) -> BoxFuture<'a, EnsayarResult<()>> + Send + Sync>;

/// A named test case: declared fixtures plus up to three phase steps
pub struct TestCase {
    name: String,
    consumes: Vec<String>,
    produces: Vec<String>,
    arrange: Option<StepFn>,
    act: Option<StepFn>,
    assert: Option<StepFn>,
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .finish_non_exhaustive()
    }
}

impl TestCase {
    /// Create a test case
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            consumes: Vec::new(),
            produces: Vec::new(),
            arrange: None,
            act: None,
            assert: None,
        }
    }

    /// Declare a fixture this case reads; it must have been produced by
    /// an earlier case or the runner fails this case before Arranging
    #[must_use]
    pub fn consumes(mut self, fixture: impl Into<String>) -> Self {
        self.consumes.push(fixture.into());
        self
    }

    /// Declare a fixture this case writes; the runner verifies it was
    /// actually written before marking the case passed
    #[must_use]
    pub fn produces(mut self, fixture: impl Into<String>) -> Self {
        self.produces.push(fixture.into());
        self
    }

    /// Set the arranging step
    #[must_use]
    pub fn arrange<F>(mut self, step: F) -> Self
    where
        F: for<'a> Fn(&'a mut ScenarioContext) -> BoxFuture<'a, EnsayarResult<()>>
            + Send
            + Sync
            + 'static,
    {
        self.arrange = Some(Box::new(step));
        self
    }

    /// Set the acting step
    #[must_use]
    pub fn act<F>(mut self, step: F) -> Self
    where
        F: for<'a> Fn(&'a mut ScenarioContext) -> BoxFuture<'a, EnsayarResult<()>>
            + Send
            + Sync
            + 'static,
    {
        self.act = Some(Box::new(step));
        self
    }

    /// Set the asserting step
    #[must_use]
    pub fn assert<F>(mut self, step: F) -> Self
    where
        F: for<'a> Fn(&'a mut ScenarioContext) -> BoxFuture<'a, EnsayarResult<()>>
            + Send
            + Sync
            + 'static,
    {
        self.assert = Some(Box::new(step));
        self
    }

    /// Case name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared consumed fixtures
    #[must_use]
    pub fn consumed(&self) -> &[String] {
        &self.consumes
    }

    /// Declared produced fixtures
    #[must_use]
    pub fn produced(&self) -> &[String] {
        &self.produces
    }

    /// Run the three phases against a context.
    ///
    /// Returns the terminal phase to report: the phase a failure happened
    /// in, or `Passed`. Arranging errors are re-categorized as setup.
    pub(crate) async fn run(&self, ctx: &mut ScenarioContext) -> (Phase, EnsayarResult<()>) {
        if let Some(step) = &self.arrange {
            tracing::debug!(case = %self.name, "arranging");
            if let Err(err) = step(ctx).await {
                return (Phase::Arranging, Err(err.into_setup()));
            }
        }
        if let Some(step) = &self.act {
            tracing::debug!(case = %self.name, "acting");
            if let Err(err) = step(ctx).await {
                return (Phase::Acting, Err(err));
            }
        }
        if let Some(step) = &self.assert {
            tracing::debug!(case = %self.name, "asserting");
            if let Err(err) = step(ctx).await {
                return (Phase::Asserting, Err(err));
            }
        }
        (Phase::Passed, Ok(()))
    }
}
