//! Job processor abstraction.
//!
//! The worker owns the queue mechanics (consume, publish, ack, reject) and
//! delegates the actual scoring to a [`JobProcessor`]. Swapping processors
//! changes what the worker computes without touching the messaging code.

use async_trait::async_trait;

use crate::error::WorkerError;
use crate::message::JobOutcome;

/// Trait for processing scoring jobs.
///
/// Implement this to plug domain logic into the worker:
///
/// ```rust,ignore
/// use queue_worker::{JobOutcome, JobProcessor, WorkerError};
///
/// struct ApiProcessor {
///     client: ScoringApiClient,
/// }
///
/// #[async_trait]
/// impl JobProcessor for ApiProcessor {
///     async fn process(&self, scoring_job_id: &str, request_id: &str)
///         -> Result<JobOutcome, WorkerError>
///     {
///         let result = self.client.execute(scoring_job_id).await?;
///         Ok(result.into())
///     }
///
///     fn name(&self) -> &'static str {
///         "ApiProcessor"
///     }
/// }
/// ```
#[async_trait]
pub trait JobProcessor: Send + Sync {
    /// One-time setup before the worker starts consuming.
    ///
    /// Runs once per worker lifetime, not per connection attempt. A failure
    /// here is fatal for the worker.
    /// Default: no-op.
    async fn initialize(&self) -> Result<(), WorkerError> {
        Ok(())
    }

    /// Process a single scoring job.
    ///
    /// Return the outcome to publish on success. Any `Err` causes the
    /// delivery to be rejected without requeue and no response is sent.
    async fn process(
        &self,
        scoring_job_id: &str,
        request_id: &str,
    ) -> Result<JobOutcome, WorkerError>;

    /// Get the processor name for logging.
    fn name(&self) -> &'static str;
}

/// Deterministic processor for local development and tests.
///
/// Never touches the network; echoes a fixed score for any job.
#[derive(Debug, Default, Clone)]
pub struct MockJobProcessor;

#[async_trait]
impl JobProcessor for MockJobProcessor {
    async fn process(
        &self,
        scoring_job_id: &str,
        _request_id: &str,
    ) -> Result<JobOutcome, WorkerError> {
        Ok(JobOutcome {
            value: Some("mock".to_string()),
            explanation: format!("mock scoring for {}", scoring_job_id),
            cost: None,
        })
    }

    fn name(&self) -> &'static str {
        "MockJobProcessor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_mock_processor_is_deterministic() {
        let processor = MockJobProcessor;
        let outcome = processor.process("job-1", "req-1").await.unwrap();
        assert_eq!(outcome.value.as_deref(), Some("mock"));
        assert_eq!(outcome.explanation, "mock scoring for job-1");
        assert_eq!(outcome.cost, None);

        let again = processor.process("job-1", "req-other").await.unwrap();
        assert_eq!(outcome, again);
    }

    #[tokio::test]
    async fn test_default_initialize_is_ok() {
        let processor = MockJobProcessor;
        assert!(processor.initialize().await.is_ok());
    }

    #[tokio::test]
    async fn test_dyn_dispatch() {
        let processor: Arc<dyn JobProcessor> = Arc::new(MockJobProcessor);
        assert_eq!(processor.name(), "MockJobProcessor");
        let outcome = processor.process("job-7", "req-7").await.unwrap();
        assert_eq!(outcome.explanation, "mock scoring for job-7");
    }
}
