//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Engine error, including fatal launch failures
    #[error("{0}")]
    Ensayar(#[from] ensayar::EnsayarError),

    /// Runtime construction error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
