//! Scoring Worker Service
//!
//! A background worker that processes scoring jobs from a RabbitMQ queue.
//!
//! ## Architecture
//!
//! ```text
//! RabbitMQ (request queue)
//!   ↓ (prefetch-bounded consumer)
//! QueueWorker
//!   ↓ (JobProcessor: mock or scoring API)
//! MockJobProcessor | ApiJobProcessor
//!   ↓
//! RabbitMQ (response queue)
//! ```
//!
//! ## Features
//!
//! - Automatic reconnection with fixed backoff
//! - Publisher confirms; responses are published before the request is acked
//! - Graceful shutdown handling
//! - Health check endpoints for Kubernetes probes
//! - Mock mode for exercising the pipeline without the scoring API

use axum::Router;
use core_config::{server::ServerConfig, ConfigError, Environment, FromEnv};
use domain_scoring::{ApiJobProcessor, ScoringApiClient, ScoringApiConfig};
use eyre::{eyre, Result, WrapErr};
use queue_worker::{
    health_router, HealthState, JobProcessor, MockJobProcessor, QueueWorker, WorkerConfig,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

pub mod config;

pub use config::{ScoringApiSettings, ScoringMode, Settings};

/// Connection name reported to the broker; also prefixes the consumer tag.
const CONNECTION_NAME: &str = "scoring-worker";

/// Start the health HTTP server
///
/// Provides the Kubernetes probe endpoints:
/// - Liveness probes: `/healthz`, `/livez`
/// - Readiness probe: `/readyz`
///
/// The server keeps answering while the worker drains, so readiness reports
/// `not_ready` during shutdown instead of the probe disappearing. The
/// returned handle resolves once `stop` fires.
async fn start_health_server(
    health: HealthState,
    config: &ServerConfig,
    stop: oneshot::Receiver<()>,
) -> Result<JoinHandle<()>> {
    let app: Router = health_router(health);

    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind health server to {}", addr))?;

    info!(address = %addr, "Health server listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = stop.await;
    });

    Ok(tokio::spawn(async move {
        if let Err(e) = server.await {
            error!(error = %e, "Health server failed");
        }
    }))
}

/// Run the scoring worker
///
/// This is the main entry point for the worker. It:
/// 1. Sets up structured logging (env-aware: JSON for prod, pretty for dev)
/// 2. Validates configuration, logging every missing variable before exiting
/// 3. Starts the health server for Kubernetes probes
/// 4. Consumes scoring requests until a shutdown signal arrives
/// 5. Stops the health server once the consumer loop has exited
///
/// # Errors
///
/// Returns an error if:
/// - Required environment variables are missing
/// - The health server fails to bind
/// - The job processor fails to initialize (e.g. unknown account key)
///
/// Broker outages are not errors; the worker retries them forever.
pub async fn run() -> Result<()> {
    // Initialize tracing (env-aware: JSON for prod, pretty for dev)
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    info!(
        name = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        "Starting scoring worker service"
    );
    info!("Environment: {:?}", environment);

    // Settings come first: a misconfigured instance must exit before the
    // probe listener binds, with one log line per missing variable so the
    // operator sees the full set in one run
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(ConfigError::MissingEnvVars(names)) => {
            for name in &names {
                error!("Missing required environment variable: {}", name);
            }
            return Err(eyre!(
                "{} required environment variable(s) missing",
                names.len()
            ));
        }
        Err(e) => return Err(e).wrap_err("Failed to load worker settings"),
    };
    info!(
        mode = %settings.mode.name(),
        request_queue = %settings.request_queue,
        response_queue = %settings.response_queue,
        "Configuration validated"
    );

    let server_config =
        ServerConfig::from_env().wrap_err("Failed to load health server configuration")?;

    let processor = build_processor(&settings.mode);

    // Set up a shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn shutdown signal handler
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    // Start health server in background; a stop is sent after the worker exits
    let health = HealthState::new();
    let (health_stop_tx, health_stop_rx) = oneshot::channel();
    let health_server = start_health_server(health.clone(), &server_config, health_stop_rx).await?;

    let worker_config = WorkerConfig::new(
        &settings.amqp_url,
        &settings.request_queue,
        &settings.response_queue,
    )
    .with_prefetch(settings.prefetch)
    .with_connection_name(CONNECTION_NAME);

    // Run the worker
    let worker = QueueWorker::new(processor, worker_config, health);
    let outcome = worker.run(shutdown_rx).await;

    // Stop the probe server only after the loop has exited, so readiness
    // reports not_ready for the entire drain
    let _ = health_stop_tx.send(());
    if let Err(e) = health_server.await {
        error!(error = %e, "Health server task failed");
    }

    outcome.wrap_err("Worker failed")?;

    info!("Scoring worker service stopped");
    Ok(())
}

/// Select the job processor for the configured scoring mode.
fn build_processor(mode: &ScoringMode) -> Arc<dyn JobProcessor> {
    match mode {
        ScoringMode::Mock => Arc::new(MockJobProcessor),
        ScoringMode::Real(api) => {
            let client = ScoringApiClient::new(ScoringApiConfig::new(
                &api.base_url,
                &api.api_key,
                &api.account_key,
            ));
            Arc::new(ApiJobProcessor::new(client))
        }
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        },
    }
}
