//! Health check handlers for queue workers.
//!
//! This module provides reusable Axum handlers for:
//! - Liveness probes (`/healthz`, `/livez`)
//! - Readiness probes (`/readyz`)
//!
//! Liveness reports on the process itself and is green for the whole
//! lifetime of the server. Readiness reflects the broker session: it is
//! flipped on once the worker has a live channel with declared queues and
//! flipped off on disconnect, draining, and shutdown.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared readiness flag for health endpoints.
///
/// Cloning shares the underlying flag. The worker loop is the only writer;
/// the health server only reads.
#[derive(Clone, Default)]
pub struct HealthState {
    ready: Arc<AtomicBool>,
}

impl HealthState {
    /// Create a new health state, initially not ready.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the worker ready or not ready.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Current readiness.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

/// Liveness probe handler.
///
/// Always returns OK if the server is running.
/// Use this for Kubernetes liveness probes.
pub async fn alive_handler() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "alive" })))
}

/// Readiness probe handler.
///
/// Returns OK only while the worker holds a live broker session.
/// Use this for Kubernetes readiness probes.
pub async fn ready_handler(State(state): State<HealthState>) -> (StatusCode, Json<Value>) {
    if state.is_ready() {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not_ready" })),
        )
    }
}

/// Fallback for unknown paths.
pub async fn not_found_handler() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not_found" })))
}

/// Create a standard health router.
///
/// This creates an Axum router with standard probe endpoints:
/// - `/healthz` - Liveness probe
/// - `/livez` - Liveness probe (alias)
/// - `/readyz` - Readiness probe
///
/// Any other path returns `404 {"error": "not_found"}`.
pub fn health_router(state: HealthState) -> axum::Router {
    use axum::routing::get;

    axum::Router::new()
        .route("/healthz", get(alive_handler))
        .route("/livez", get(alive_handler))
        .route("/readyz", get(ready_handler))
        .fallback(not_found_handler)
        .with_state(state)
}
