//! Scoring domain errors.

use queue_worker::WorkerError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors from the scoring API and processor
#[derive(Error, Debug)]
pub enum ScoringError {
    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success response from the scoring API
    #[error("Scoring API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// Account key did not resolve to an account
    #[error("No account found with key: {0}")]
    AccountNotFound(String),

    /// Scoring job id did not resolve to a job
    #[error("ScoringJob not found: {0}")]
    JobNotFound(String),

    /// Scoring ran but reported a semantic failure
    #[error("Scoring returned ERROR: {0}")]
    ScoreFailed(String),
}

/// Result alias for scoring operations.
pub type ScoringResult<T> = Result<T, ScoringError>;

impl From<ScoringError> for WorkerError {
    fn from(err: ScoringError) -> Self {
        WorkerError::Processing(err.to_string())
    }
}
