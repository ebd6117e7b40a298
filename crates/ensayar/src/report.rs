//! Suite reports.

use std::time::Duration;

use crate::result::{EnsayarError, ErrorCategory};
use crate::scenario::Phase;

/// Terminal state of one test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseStatus {
    /// Every phase succeeded
    Passed,
    /// A phase failed
    Failed {
        /// Failure category from the error taxonomy
        category: ErrorCategory,
        /// Error message, including the expected-vs-actual diff for
        /// assertion mismatches
        message: String,
    },
}

/// Report for one test case
#[derive(Debug, Clone)]
pub struct CaseReport {
    /// Case name
    pub name: String,
    /// Terminal status
    pub status: CaseStatus,
    /// Phase the case ended in
    pub phase_reached: Phase,
    /// Case duration
    pub duration: Duration,
}

impl CaseReport {
    /// Create a passing report
    #[must_use]
    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Passed,
            phase_reached: Phase::Passed,
            duration,
        }
    }

    /// Create a failing report from the error that ended the case
    #[must_use]
    pub fn failed(
        name: impl Into<String>,
        phase: Phase,
        error: &EnsayarError,
        duration: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Failed {
                category: error.category(),
                message: error.to_string(),
            },
            phase_reached: phase,
            duration,
        }
    }

    /// Whether the case passed
    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self.status, CaseStatus::Passed)
    }
}

/// Report for a whole suite run
#[derive(Debug, Clone)]
pub struct SuiteReport {
    /// Suite name
    pub suite_name: String,
    /// Per-case reports, in execution order
    pub cases: Vec<CaseReport>,
    /// Total duration
    pub duration: Duration,
}

impl SuiteReport {
    /// Check if all cases passed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.cases.iter().all(CaseReport::is_passed)
    }

    /// Count passed cases
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.cases.iter().filter(|c| c.is_passed()).count()
    }

    /// Count failed cases
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.cases.iter().filter(|c| !c.is_passed()).count()
    }

    /// Total case count
    #[must_use]
    pub fn total(&self) -> usize {
        self.cases.len()
    }

    /// Failed cases only
    #[must_use]
    pub fn failures(&self) -> Vec<&CaseReport> {
        self.cases.iter().filter(|c| !c.is_passed()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let timeout = EnsayarError::ResponseTimeout {
            pattern: "url~\"/data/games\" status=200".to_string(),
            timeout_ms: 10000,
        };
        let report = SuiteReport {
            suite_name: "gamesplay e2e".to_string(),
            cases: vec![
                CaseReport::passed("register", Duration::from_millis(1200)),
                CaseReport::failed("create", Phase::Acting, &timeout, Duration::from_millis(900)),
            ],
            duration: Duration::from_secs(3),
        };
        assert!(!report.all_passed());
        assert_eq!(report.passed_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.total(), 2);
        assert_eq!(report.failures().len(), 1);

        match &report.failures()[0].status {
            CaseStatus::Failed { category, message } => {
                assert_eq!(*category, ErrorCategory::ResponseTimeout);
                assert!(message.contains("/data/games"));
            }
            CaseStatus::Passed => panic!("expected a failure"),
        }
    }
}
