//! Scoring Domain
//!
//! Real-mode scoring for the queue worker: a bearer-auth client for the
//! scoring API and a `JobProcessor` implementation that drives each job
//! through its status lifecycle.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐
//! │ ApiJobProcessor│  ← JobProcessor impl, status lifecycle
//! └──────┬────────┘
//!        │
//! ┌──────▼────────┐
//! │ ScoringApiClient│  ← HTTP calls, auth, error mapping
//! └──────┬────────┘
//!        │
//! ┌──────▼────────┐
//! │    Models     │  ← Account, ScoringJob, transitions
//! └───────────────┘
//! ```

pub mod client;
pub mod error;
pub mod models;
pub mod processor;

// Re-export commonly used types
pub use client::{ScoringApiClient, ScoringApiConfig};
pub use error::{ScoringError, ScoringResult};
pub use models::{Account, JobStatus, ScoreResult, ScoringJob, StatusTransition};
pub use processor::ApiJobProcessor;
