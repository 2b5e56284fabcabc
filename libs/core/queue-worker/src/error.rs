//! Worker error types.
//!
//! Failures fall into two layers with different handling:
//! - **Connection layer** (`Amqp`): retried forever by the worker loop with
//!   a fixed backoff, surfaced through readiness and logs.
//! - **Message layer** (`InvalidMessage`, `Processing`, `Serialization`):
//!   terminal for that delivery; the message is rejected without requeue and
//!   no response is published.

use thiserror::Error;

/// Queue worker errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Broker connection, channel, or protocol error
    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Malformed inbound envelope (never retried)
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Job processing failed, including semantic error results
    #[error("Processing error: {0}")]
    Processing(String),
}

impl WorkerError {
    /// Create a malformed-message error
    pub fn invalid_message(message: impl Into<String>) -> Self {
        WorkerError::InvalidMessage(message.into())
    }

    /// Create a processing error
    pub fn processing(message: impl Into<String>) -> Self {
        WorkerError::Processing(message.into())
    }
}

impl From<serde_json::Error> for WorkerError {
    fn from(err: serde_json::Error) -> Self {
        WorkerError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WorkerError::invalid_message("missing or empty request_id");
        assert_eq!(
            err.to_string(),
            "Invalid message: missing or empty request_id"
        );

        let err = WorkerError::processing("scoring returned ERROR");
        assert_eq!(err.to_string(), "Processing error: scoring returned ERROR");
    }

    #[test]
    fn test_serde_error_converts_to_serialization() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = WorkerError::from(parse_err);
        assert!(matches!(err, WorkerError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error"));
    }
}
