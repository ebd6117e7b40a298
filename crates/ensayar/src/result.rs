//! Result and error types for Ensayar.

use thiserror::Error;

/// Result type for Ensayar operations
pub type EnsayarResult<T> = Result<T, EnsayarError>;

/// Errors that can occur while driving a suite
#[derive(Debug, Error)]
pub enum EnsayarError {
    /// Browser process could not be started; fatal for the suite
    #[error("Failed to launch browser: {message}")]
    Launch {
        /// Error message
        message: String,
    },

    /// Session-level failure (page creation, storage clearing, tap wiring)
    #[error("Session error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// A selector did not resolve within its timeout
    #[error("Element not found: {selector} (waited {timeout_ms}ms)")]
    ElementNotFound {
        /// Selector in display form
        selector: String,
        /// Timeout that elapsed
        timeout_ms: u64,
    },

    /// No network response matched the predicate within the window
    #[error("No response matching {pattern} within {timeout_ms}ms")]
    ResponseTimeout {
        /// Predicate in display form
        pattern: String,
        /// Timeout that elapsed
        timeout_ms: u64,
    },

    /// Expected-vs-actual mismatch from the assertion layer
    #[error("Assertion mismatch{}: expected {expected}, got {actual}", context_suffix(.context))]
    AssertionMismatch {
        /// Expected value, rendered
        expected: String,
        /// Actual value, rendered
        actual: String,
        /// What was being compared
        context: Option<String>,
    },

    /// Arranging-phase failure; the case never reached its Acting phase
    #[error("Setup failed: {message}")]
    Setup {
        /// Error message
        message: String,
    },

    /// A consumed fixture was never produced by an earlier case
    #[error("Fixture '{name}' is not available; a prior case must produce it")]
    MissingFixture {
        /// Fixture name
        name: String,
    },

    /// Script evaluation error in the page
    #[error("Evaluation failed: {message}")]
    Eval {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn context_suffix(context: &Option<String>) -> String {
    context
        .as_ref()
        .map(|c| format!(" ({c})"))
        .unwrap_or_default()
}

/// Failure category used in suite reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorCategory {
    /// Browser process could not start; aborts the suite
    Launch,
    /// Precondition/arranging failure, including missing fixtures
    Setup,
    /// Selector never resolved
    ElementNotFound,
    /// Correlated response never arrived
    ResponseTimeout,
    /// Expected-vs-actual mismatch
    AssertionMismatch,
    /// Everything else (session plumbing, I/O, JSON)
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Launch => "launch",
            Self::Setup => "setup",
            Self::ElementNotFound => "element-not-found",
            Self::ResponseTimeout => "response-timeout",
            Self::AssertionMismatch => "assertion-mismatch",
            Self::Internal => "internal",
        };
        write!(f, "{name}")
    }
}

impl EnsayarError {
    /// Classify this error for reporting.
    ///
    /// `ElementNotFound` and `ResponseTimeout` stay distinguishable here;
    /// both fail a case but they point at different things (a DOM that
    /// never settled vs a network exchange that never happened).
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Launch { .. } => ErrorCategory::Launch,
            Self::Setup { .. } | Self::MissingFixture { .. } => ErrorCategory::Setup,
            Self::ElementNotFound { .. } => ErrorCategory::ElementNotFound,
            Self::ResponseTimeout { .. } => ErrorCategory::ResponseTimeout,
            Self::AssertionMismatch { .. } => ErrorCategory::AssertionMismatch,
            Self::Session { .. }
            | Self::Navigation { .. }
            | Self::Eval { .. }
            | Self::Io(_)
            | Self::Json(_) => ErrorCategory::Internal,
        }
    }

    /// True for errors that abort the whole suite rather than one case
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Launch { .. })
    }

    /// Wrap an arranging-phase error as a setup failure.
    ///
    /// Fatal launch errors keep their identity; everything else that
    /// happens before the Acting phase is a setup failure by definition.
    #[must_use]
    pub fn into_setup(self) -> Self {
        match self {
            Self::Launch { .. } | Self::Setup { .. } | Self::MissingFixture { .. } => self,
            other => Self::Setup {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let not_found = EnsayarError::ElementNotFound {
            selector: "css=form".to_string(),
            timeout_ms: 5000,
        };
        let timeout = EnsayarError::ResponseTimeout {
            pattern: "/users/register (200)".to_string(),
            timeout_ms: 10000,
        };
        assert_eq!(not_found.category(), ErrorCategory::ElementNotFound);
        assert_eq!(timeout.category(), ErrorCategory::ResponseTimeout);
        assert_ne!(not_found.category(), timeout.category());
    }

    #[test]
    fn test_missing_fixture_is_setup() {
        let err = EnsayarError::MissingFixture {
            name: "game_title".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Setup);
    }

    #[test]
    fn test_into_setup_preserves_launch() {
        let launch = EnsayarError::Launch {
            message: "binary missing".to_string(),
        };
        assert!(launch.into_setup().is_fatal());

        let nav = EnsayarError::Navigation {
            url: "http://localhost:3002".to_string(),
            message: "refused".to_string(),
        };
        assert_eq!(nav.into_setup().category(), ErrorCategory::Setup);
    }

    #[test]
    fn test_mismatch_display() {
        let err = EnsayarError::AssertionMismatch {
            expected: "\"abv@abv.bg\"".to_string(),
            actual: "\"other@abv.bg\"".to_string(),
            context: Some("json.email".to_string()),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("json.email"));
        assert!(rendered.contains("expected"));
    }
}
