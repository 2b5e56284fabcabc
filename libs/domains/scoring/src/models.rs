//! Scoring API entities and DTOs.

use chrono::{DateTime, Utc};
use queue_worker::JobOutcome;
use serde::{Deserialize, Serialize};

/// An account on the scoring platform
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
}

/// Lifecycle status of a scoring job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// A scoring job record
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringJob {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub scorecard_id: Option<String>,
    #[serde(default)]
    pub score_id: Option<String>,
}

/// Raw result returned by the scoring API
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreResult {
    pub value: Option<String>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub cost: Option<f64>,
}

impl From<ScoreResult> for JobOutcome {
    fn from(result: ScoreResult) -> Self {
        JobOutcome {
            value: result.value,
            explanation: result.explanation,
            cost: result.cost,
        }
    }
}

/// A status transition to apply to a scoring job.
///
/// Serializes to the API's update payload, e.g.
/// `{"status": "IN_PROGRESS", "startedAt": "..."}`.
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "status",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum StatusTransition {
    InProgress {
        started_at: DateTime<Utc>,
    },
    Completed {
        completed_at: DateTime<Utc>,
    },
    Failed {
        error_message: String,
        completed_at: DateTime<Utc>,
    },
}

impl StatusTransition {
    /// Job picked up, stamped with the current time.
    pub fn in_progress() -> Self {
        StatusTransition::InProgress {
            started_at: Utc::now(),
        }
    }

    /// Job finished successfully, stamped with the current time.
    pub fn completed() -> Self {
        StatusTransition::Completed {
            completed_at: Utc::now(),
        }
    }

    /// Job failed with the given message, stamped with the current time.
    pub fn failed(error_message: impl Into<String>) -> Self {
        StatusTransition::Failed {
            error_message: error_message.into(),
            completed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_status_wire_format() {
        assert_eq!(
            serde_json::to_value(JobStatus::InProgress).unwrap(),
            json!("IN_PROGRESS")
        );
        assert_eq!(
            serde_json::to_value(JobStatus::Completed).unwrap(),
            json!("COMPLETED")
        );
        assert_eq!(
            serde_json::from_value::<JobStatus>(json!("FAILED")).unwrap(),
            JobStatus::Failed
        );
    }

    #[test]
    fn test_scoring_job_deserializes_camel_case() {
        let job: ScoringJob = serde_json::from_value(json!({
            "id": "job-1",
            "status": "PENDING",
            "itemId": "item-9",
            "scorecardId": "sc-1",
            "scoreId": "score-2"
        }))
        .unwrap();

        assert_eq!(job.id, "job-1");
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.item_id.as_deref(), Some("item-9"));
    }

    #[test]
    fn test_status_transition_payloads() {
        let value = serde_json::to_value(StatusTransition::in_progress()).unwrap();
        assert_eq!(value["status"], "IN_PROGRESS");
        assert!(value["startedAt"].is_string());

        let value = serde_json::to_value(StatusTransition::failed("boom")).unwrap();
        assert_eq!(value["status"], "FAILED");
        assert_eq!(value["errorMessage"], "boom");
        assert!(value["completedAt"].is_string());
    }

    #[test]
    fn test_score_result_defaults() {
        let result: ScoreResult = serde_json::from_value(json!({ "value": "0.8" })).unwrap();
        assert_eq!(result.value.as_deref(), Some("0.8"));
        assert_eq!(result.explanation, "");
        assert_eq!(result.cost, None);
    }

    #[test]
    fn test_score_result_into_outcome() {
        let result: ScoreResult = serde_json::from_value(json!({
            "value": "yes",
            "explanation": "matched rubric",
            "cost": 0.0125
        }))
        .unwrap();

        let outcome = JobOutcome::from(result);
        assert_eq!(outcome.value.as_deref(), Some("yes"));
        assert_eq!(outcome.explanation, "matched rubric");
        assert_eq!(outcome.cost, Some(0.0125));
    }
}
