//! Queue Worker Framework
//!
//! A resilient AMQP queue worker for request/response scoring pipelines.
//!
//! ## Features
//!
//! - **Pluggable processing**: `JobProcessor` separates scoring logic from
//!   queue mechanics
//! - **Resilient sessions**: automatic reconnect with fixed backoff and a
//!   liveness monitor for silently dropped connections
//! - **At-least-once delivery**: responses are published (and confirmed)
//!   before the request is acknowledged
//! - **Poison message safety**: malformed or failed messages are rejected
//!   without requeue
//! - **Health endpoints**: K8s-ready liveness and readiness probes
//!
//! ## Example
//!
//! ```ignore
//! use queue_worker::{health_router, HealthState, MockJobProcessor, QueueWorker, WorkerConfig};
//!
//! let config = WorkerConfig::new(amqp_url, "scoring.requests", "scoring.responses")
//!     .with_connection_name("scoring-worker");
//!
//! let health = HealthState::new();
//! let worker = QueueWorker::new(Arc::new(MockJobProcessor), config, health.clone());
//!
//! // Serve health_router(health) elsewhere, then:
//! worker.run(shutdown_rx).await?;
//! ```

mod config;
mod error;
mod health;
mod message;
mod processor;
mod publisher;
mod session;
mod worker;

// Re-export main types
pub use config::{WorkerConfig, DEFAULT_PREFETCH};
pub use error::WorkerError;
pub use health::{health_router, HealthState};
pub use message::{JobOutcome, ScoreRequest, ScoreResponse};
pub use processor::{JobProcessor, MockJobProcessor};
pub use publisher::ResponsePublisher;
pub use worker::QueueWorker;
