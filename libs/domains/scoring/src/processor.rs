//! Scoring job processor backed by the scoring API.
//!
//! This module provides the `ApiJobProcessor` that implements `JobProcessor`,
//! driving a scoring job through its status lifecycle while the worker owns
//! the queue mechanics.

use std::sync::OnceLock;

use async_trait::async_trait;
use queue_worker::{JobOutcome, JobProcessor, WorkerError};
use tracing::info;

use crate::client::ScoringApiClient;
use crate::error::ScoringError;
use crate::models::StatusTransition;

/// Maximum length of the error message stored on a failed job.
const MAX_ERROR_MESSAGE_CHARS: usize = 255;

/// Processor that scores jobs through the scoring API.
///
/// Lifecycle per job: fetch → `IN_PROGRESS` → execute → `COMPLETED`, or
/// `FAILED` when the scorer reports an `ERROR` value. The job record's
/// terminal status is the durable record of failures; failed deliveries are
/// dropped from the queue.
pub struct ApiJobProcessor {
    client: ScoringApiClient,
    account_id: OnceLock<String>,
}

impl ApiJobProcessor {
    /// Create a new processor. The account is resolved in `initialize`.
    pub fn new(client: ScoringApiClient) -> Self {
        Self {
            client,
            account_id: OnceLock::new(),
        }
    }

    fn account_id(&self) -> Result<&str, WorkerError> {
        self.account_id
            .get()
            .map(String::as_str)
            .ok_or_else(|| WorkerError::processing("processor used before initialize"))
    }
}

#[async_trait]
impl JobProcessor for ApiJobProcessor {
    async fn initialize(&self) -> Result<(), WorkerError> {
        let account_key = self.client.account_key().to_string();
        info!(account_key = %account_key, "Resolving account");

        let account = self.client.resolve_account(&account_key).await?;
        info!(
            account = %account.name,
            account_id = %account.id,
            "Initialized with account"
        );

        let _ = self.account_id.set(account.id);
        Ok(())
    }

    async fn process(
        &self,
        scoring_job_id: &str,
        request_id: &str,
    ) -> Result<JobOutcome, WorkerError> {
        info!(
            scoring_job_id = %scoring_job_id,
            request_id = %request_id,
            "Processing scoring job"
        );

        let job = self.client.fetch_job(scoring_job_id).await?;
        self.client
            .update_status(&job.id, StatusTransition::in_progress())
            .await?;

        let result = self.client.execute(&job.id, self.account_id()?).await?;

        if is_error_value(result.value.as_deref()) {
            let message = failure_message(&result.explanation);
            self.client
                .update_status(&job.id, StatusTransition::failed(message.clone()))
                .await?;
            return Err(ScoringError::ScoreFailed(message).into());
        }

        self.client
            .update_status(&job.id, StatusTransition::completed())
            .await?;

        Ok(result.into())
    }

    fn name(&self) -> &'static str {
        "ApiJobProcessor"
    }
}

/// Whether the scorer reported a semantic failure instead of a score.
fn is_error_value(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("error"))
}

/// Error message stored on a failed job, capped for the API's column size.
fn failure_message(explanation: &str) -> String {
    if explanation.is_empty() {
        "Scoring returned ERROR".to_string()
    } else {
        explanation.chars().take(MAX_ERROR_MESSAGE_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_error_value() {
        assert!(is_error_value(Some("ERROR")));
        assert!(is_error_value(Some("error")));
        assert!(is_error_value(Some("Error")));
        assert!(!is_error_value(Some("0.95")));
        assert!(!is_error_value(Some("errors")));
        assert!(!is_error_value(None));
    }

    #[test]
    fn test_failure_message_truncates_to_255_chars() {
        let long = "x".repeat(400);
        let message = failure_message(&long);
        assert_eq!(message.chars().count(), 255);
    }

    #[test]
    fn test_failure_message_truncates_on_char_boundaries() {
        let long = "é".repeat(300);
        let message = failure_message(&long);
        assert_eq!(message.chars().count(), 255);
    }

    #[test]
    fn test_failure_message_defaults_when_explanation_empty() {
        assert_eq!(failure_message(""), "Scoring returned ERROR");
        assert_eq!(failure_message("model timed out"), "model timed out");
    }
}
