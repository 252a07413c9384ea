//! CLI error type.

use std::fmt;

/// Errors that end the `fj-precache` run.
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line or environment configuration.
    Config(String),
    /// Logging could not be initialized.
    Logging(String),
    /// The pre-cache run could not start.
    Precache(String),
    /// Some files failed to cache; the count of failures.
    Failed(usize),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Logging(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Precache(msg) => write!(f, "Pre-caching failed: {}", msg),
            CliError::Failed(count) => write!(f, "{} file(s) failed to cache", count),
        }
    }
}

impl std::error::Error for CliError {}

impl From<fast_jsonl::Error> for CliError {
    fn from(e: fast_jsonl::Error) -> Self {
        match e {
            fast_jsonl::Error::InvalidConfig(msg) => CliError::Config(msg),
            other => CliError::Precache(other.to_string()),
        }
    }
}
