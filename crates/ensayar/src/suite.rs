//! Suite runner: strictly sequential execution over isolated sessions.
//!
//! Cases run in declaration order, never in parallel and never reordered,
//! because later cases read fixtures written by earlier ones. Each case
//! gets a fresh isolated session before it starts and has its page closed
//! after it ends, pass or fail. A failed case never stops the suite; only
//! a launch failure is fatal. Suite teardown is best-effort.

use std::time::Instant;

use crate::config::SuiteConfig;
use crate::fixtures::FixtureStore;
use crate::host::SessionProvider;
use crate::report::{CaseReport, SuiteReport};
use crate::result::{EnsayarError, EnsayarResult};
use crate::scenario::{Phase, ScenarioContext, TestCase};

/// An ordered sequence of test cases sharing one browser process
pub struct Suite {
    name: String,
    config: SuiteConfig,
    cases: Vec<TestCase>,
}

impl std::fmt::Debug for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("cases", &self.cases.len())
            .finish_non_exhaustive()
    }
}

impl Suite {
    /// Create an empty suite
    #[must_use]
    pub fn new(name: impl Into<String>, config: SuiteConfig) -> Self {
        Self {
            name: name.into(),
            config,
            cases: Vec::new(),
        }
    }

    /// Append a test case; execution order is declaration order
    #[must_use]
    pub fn case(mut self, case: TestCase) -> Self {
        self.cases.push(case);
        self
    }

    /// Suite name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The cases, in execution order
    #[must_use]
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Keep only cases whose name contains the filter.
    ///
    /// Filtering can orphan declared fixture dependencies; the runner's
    /// consumes check then fails those cases loudly instead of letting
    /// them chase state that was never produced.
    pub fn retain_matching(&mut self, filter: &str) {
        self.cases.retain(|c| c.name().contains(filter));
    }

    /// Run every case in order against sessions from the provider.
    ///
    /// # Errors
    ///
    /// Only fatal launch errors propagate; everything else lands in the
    /// report.
    pub async fn run<P: SessionProvider>(&self, provider: &P) -> EnsayarResult<SuiteReport> {
        let start = Instant::now();
        let fixtures = FixtureStore::new();
        let mut reports = Vec::with_capacity(self.cases.len());

        tracing::info!(suite = %self.name, cases = self.cases.len(), "suite started");

        for case in &self.cases {
            let case_start = Instant::now();

            // Declared-order enforcement: a consumed fixture missing here
            // means an earlier producer was skipped, filtered out, or
            // failed. Fail this case now, before any session is spent.
            if let Some(missing) = case.consumed().iter().find(|n| !fixtures.contains(n)) {
                let err = EnsayarError::MissingFixture {
                    name: missing.clone(),
                };
                tracing::warn!(case = %case.name(), %err, "skipping body of case");
                reports.push(CaseReport::failed(
                    case.name(),
                    Phase::Arranging,
                    &err,
                    case_start.elapsed(),
                ));
                continue;
            }

            let session = match provider.open_session().await {
                Ok(session) => session,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    let err = err.into_setup();
                    reports.push(CaseReport::failed(
                        case.name(),
                        Phase::Arranging,
                        &err,
                        case_start.elapsed(),
                    ));
                    continue;
                }
            };

            tracing::info!(case = %case.name(), session = %session.id, "case started");
            let mut ctx = ScenarioContext::from_session(&session, &self.config, fixtures.clone());
            let (phase, outcome) = case.run(&mut ctx).await;
            drop(ctx);

            if let Err(err) = provider.close_session(session).await {
                tracing::warn!(case = %case.name(), %err, "session close failed");
            }

            let report = match outcome {
                Ok(()) => Self::verify_produces(case, &fixtures, case_start),
                Err(err) => {
                    tracing::warn!(case = %case.name(), %phase, %err, "case failed");
                    CaseReport::failed(case.name(), phase, &err, case_start.elapsed())
                }
            };
            reports.push(report);
        }

        if let Err(err) = provider.shutdown().await {
            tracing::warn!(%err, "suite teardown failed");
        }

        let report = SuiteReport {
            suite_name: self.name.clone(),
            cases: reports,
            duration: start.elapsed(),
        };
        tracing::info!(
            passed = report.passed_count(),
            failed = report.failed_count(),
            "suite finished"
        );
        Ok(report)
    }

    /// A case that succeeded but never wrote a declared fixture would
    /// poison every later consumer; fail it loudly instead.
    fn verify_produces(
        case: &TestCase,
        fixtures: &FixtureStore,
        case_start: Instant,
    ) -> CaseReport {
        if let Some(missing) = case.produced().iter().find(|n| !fixtures.contains(n)) {
            let err = EnsayarError::Setup {
                message: format!(
                    "case '{}' declared fixture '{missing}' but never produced it",
                    case.name()
                ),
            };
            return CaseReport::failed(case.name(), Phase::Asserting, &err, case_start.elapsed());
        }
        CaseReport::passed(case.name(), case_start.elapsed())
    }
}
