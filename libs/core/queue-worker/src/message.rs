//! Wire envelopes for the request and response queues.

use serde::{Deserialize, Serialize};

use crate::error::WorkerError;

/// Inbound scoring request envelope
///
/// Unknown fields are ignored. Missing identifiers deserialize as empty
/// strings and are rejected by [`ScoreRequest::from_bytes`].
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRequest {
    /// Correlates the response to the request
    #[serde(default)]
    pub request_id: String,
    /// Identifies the job to score
    #[serde(default)]
    pub scoring_job_id: String,
}

impl ScoreRequest {
    /// Parse and validate a raw delivery payload
    pub fn from_bytes(data: &[u8]) -> Result<Self, WorkerError> {
        let request: ScoreRequest = serde_json::from_slice(data)
            .map_err(|e| WorkerError::invalid_message(format!("invalid JSON envelope: {e}")))?;
        if request.request_id.is_empty() {
            return Err(WorkerError::invalid_message("missing or empty request_id"));
        }
        if request.scoring_job_id.is_empty() {
            return Err(WorkerError::invalid_message(
                "missing or empty scoring_job_id",
            ));
        }
        Ok(request)
    }
}

/// Result of processing a single scoring job
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub value: Option<String>,
    pub explanation: String,
    pub cost: Option<f64>,
}

/// Outbound scoring response envelope
///
/// Published before the request is acknowledged, so a crash between publish
/// and ack can produce a duplicate response for the same `request_id`.
/// Consumers deduplicate on that field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub request_id: String,
    pub status: String,
    pub value: Option<String>,
    pub explanation: String,
    pub cost: Option<f64>,
}

impl ScoreResponse {
    /// Build a success response for a processed request
    pub fn success(request_id: impl Into<String>, outcome: JobOutcome) -> Self {
        Self {
            request_id: request_id.into(),
            status: "success".to_string(),
            value: outcome.value,
            explanation: outcome.explanation,
            cost: outcome.cost,
        }
    }
}
