//! Queue worker runtime.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use lapin::message::Delivery;
use lapin::options::{BasicAckOptions, BasicRejectOptions};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::WorkerConfig;
use crate::error::WorkerError;
use crate::health::HealthState;
use crate::message::{ScoreRequest, ScoreResponse};
use crate::processor::JobProcessor;
use crate::publisher::ResponsePublisher;
use crate::session::Session;

/// Delay before retrying after a failed or lost broker session.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// How often an idle session is checked for silent connection loss.
const MONITOR_INTERVAL: Duration = Duration::from_secs(1);

/// Why a session ended.
enum SessionEnd {
    /// Shutdown was requested; the worker exits.
    Shutdown,
    /// The broker connection died; the worker reconnects.
    ConnectionLost,
}

/// Resilient AMQP queue worker.
///
/// This struct encapsulates the worker loop with:
/// - Automatic reconnection with fixed backoff
/// - Publisher confirms on every response
/// - Readiness reporting for orchestrators
/// - Graceful shutdown that drains in-flight jobs
///
/// The worker consumes JSON scoring requests from one queue, runs them
/// through a [`JobProcessor`], and publishes JSON responses to another.
/// A response is always published before its request is acknowledged, so
/// no acknowledged request can silently lose its response.
pub struct QueueWorker {
    processor: Arc<dyn JobProcessor>,
    config: WorkerConfig,
    health: HealthState,
}

impl QueueWorker {
    /// Create a new queue worker.
    pub fn new(
        processor: Arc<dyn JobProcessor>,
        config: WorkerConfig,
        health: HealthState,
    ) -> Self {
        Self {
            processor,
            config,
            health,
        }
    }

    /// Run the worker loop.
    ///
    /// Connects, consumes, and reconnects on failure until the shutdown
    /// latch flips. Use the shutdown receiver to gracefully stop the worker;
    /// dropping the sender is treated as a shutdown request.
    ///
    /// Returns an error only if the processor fails to initialize; broker
    /// failures are retried forever.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), WorkerError> {
        info!(
            request_queue = %self.config.request_queue,
            response_queue = %self.config.response_queue,
            prefetch = %self.config.prefetch,
            processor = %self.processor.name(),
            "Starting queue worker"
        );

        // One-time processor setup; a failure here is fatal
        self.processor.initialize().await?;

        loop {
            if *shutdown.borrow() {
                info!("Received shutdown signal, stopping worker");
                break;
            }

            match Session::establish(&self.config).await {
                Ok((session, consumer)) => {
                    self.health.set_ready(true);
                    info!(
                        request_queue = %self.config.request_queue,
                        response_queue = %self.config.response_queue,
                        "Connected to RabbitMQ and declared queues"
                    );

                    let end = self.drive_session(session, consumer, &mut shutdown).await;
                    self.health.set_ready(false);

                    match end {
                        SessionEnd::Shutdown => break,
                        SessionEnd::ConnectionLost => {
                            warn!(
                                backoff_secs = %RECONNECT_BACKOFF.as_secs(),
                                "Broker session lost, reconnecting"
                            );
                        }
                    }
                }
                Err(e) => {
                    error!(
                        error = %e,
                        backoff_secs = %RECONNECT_BACKOFF.as_secs(),
                        "Failed to establish broker session"
                    );
                }
            }

            // Fixed backoff, interruptible by shutdown
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender counts as a shutdown request
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(RECONNECT_BACKOFF) => {}
            }
        }

        info!("Queue worker stopped");
        Ok(())
    }

    /// Drive one established session until shutdown or connection loss.
    ///
    /// Deliveries run on spawned tasks; the channel prefetch bounds how many
    /// are in flight at once. In-flight handlers are always drained before
    /// teardown so their acks still have a live channel.
    async fn drive_session(
        &self,
        session: Session,
        mut consumer: lapin::Consumer,
        shutdown: &mut watch::Receiver<bool>,
    ) -> SessionEnd {
        let publisher = ResponsePublisher::new(
            session.channel.clone(),
            self.config.response_queue.clone(),
        );
        let mut handlers: JoinSet<()> = JoinSet::new();
        let mut monitor = tokio::time::interval(MONITOR_INTERVAL);

        info!(consumer_tag = %session.consumer_tag, "Consumer started");

        let end = loop {
            // Drop completed handlers so the set only holds in-flight tasks
            Self::reap_finished(&mut handlers);

            tokio::select! {
                delivery = consumer.next() => {
                    match delivery {
                        Some(Ok(delivery)) => {
                            let processor = Arc::clone(&self.processor);
                            let publisher = publisher.clone();
                            handlers.spawn(async move {
                                Self::handle_delivery(processor, publisher, delivery).await;
                            });
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "Consumer stream error");
                            break SessionEnd::ConnectionLost;
                        }
                        None => {
                            warn!("Consumer stream closed by broker");
                            break SessionEnd::ConnectionLost;
                        }
                    }
                }
                _ = monitor.tick() => {
                    if !session.is_open() {
                        warn!("Broker connection no longer open");
                        break SessionEnd::ConnectionLost;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown requested, draining session");
                        break SessionEnd::Shutdown;
                    }
                }
            }
        };

        if matches!(end, SessionEnd::Shutdown) {
            if let Err(e) = session.cancel_consumer().await {
                warn!(error = %e, "Failed to cancel consumer");
            }
        }

        // Wait for in-flight handlers to settle their deliveries
        while handlers.join_next().await.is_some() {}

        if matches!(end, SessionEnd::Shutdown) {
            session.close().await;
        }

        end
    }

    /// Discard finished handler tasks.
    ///
    /// A `JoinSet` retains completed tasks until they are joined, so a
    /// long-lived session must reap as it goes, not just at teardown.
    fn reap_finished(handlers: &mut JoinSet<()>) {
        while handlers.try_join_next().is_some() {}
    }

    /// Handle one delivery end to end: decode, process, publish, ack.
    ///
    /// Every failure path rejects without requeue. A message that cannot be
    /// handled must never cycle back onto the request queue.
    async fn handle_delivery(
        processor: Arc<dyn JobProcessor>,
        publisher: ResponsePublisher,
        delivery: Delivery,
    ) {
        let request = match ScoreRequest::from_bytes(&delivery.data) {
            Ok(request) => request,
            Err(e) => {
                warn!(
                    error = %e,
                    payload = %String::from_utf8_lossy(&delivery.data),
                    "Rejecting malformed message"
                );
                Self::reject(&delivery).await;
                return;
            }
        };

        let outcome = match processor
            .process(&request.scoring_job_id, &request.request_id)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    request_id = %request.request_id,
                    scoring_job_id = %request.scoring_job_id,
                    error = %e,
                    "Failed to process message"
                );
                Self::reject(&delivery).await;
                return;
            }
        };

        let response = ScoreResponse::success(&request.request_id, outcome);
        if let Err(e) = publisher.publish(&response).await {
            error!(
                request_id = %request.request_id,
                error = %e,
                "Failed to publish response"
            );
            Self::reject(&delivery).await;
            return;
        }

        if let Err(e) = delivery.acker.ack(BasicAckOptions::default()).await {
            error!(
                request_id = %request.request_id,
                error = %e,
                "Failed to ack message"
            );
            return;
        }

        info!(
            request_id = %request.request_id,
            scoring_job_id = %request.scoring_job_id,
            "Processed message"
        );
    }

    /// Reject a delivery without requeue.
    async fn reject(delivery: &Delivery) {
        if let Err(e) = delivery
            .acker
            .reject(BasicRejectOptions { requeue: false })
            .await
        {
            warn!(error = %e, "Failed to reject message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::MockJobProcessor;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingInitProcessor;

    #[async_trait]
    impl JobProcessor for FailingInitProcessor {
        async fn initialize(&self) -> Result<(), WorkerError> {
            Err(WorkerError::processing("account lookup failed"))
        }

        async fn process(
            &self,
            _scoring_job_id: &str,
            _request_id: &str,
        ) -> Result<crate::message::JobOutcome, WorkerError> {
            Err(WorkerError::processing("not reachable in this test"))
        }

        fn name(&self) -> &'static str {
            "FailingInitProcessor"
        }
    }

    #[tokio::test]
    async fn test_run_exits_before_connecting_when_shutdown_already_set() {
        let (tx, rx) = watch::channel(true);
        let health = HealthState::new();
        let worker = QueueWorker::new(
            Arc::new(MockJobProcessor),
            // Nothing listens here; run() must not even try to connect
            WorkerConfig::new("amqp://127.0.0.1:1", "requests", "responses"),
            health.clone(),
        );

        worker.run(rx).await.unwrap();
        assert!(!health.is_ready());
        drop(tx);
    }

    #[tokio::test]
    async fn test_run_fails_fast_when_initialize_fails() {
        let (tx, rx) = watch::channel(false);
        let health = HealthState::new();
        let worker = QueueWorker::new(
            Arc::new(FailingInitProcessor),
            WorkerConfig::new("amqp://127.0.0.1:1", "requests", "responses"),
            health.clone(),
        );

        let err = worker.run(rx).await.unwrap_err();
        assert!(matches!(err, WorkerError::Processing(_)));
        assert!(!health.is_ready());
        drop(tx);
    }

    #[tokio::test]
    async fn test_run_stops_when_shutdown_sender_is_dropped() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let health = HealthState::new();
        let worker = QueueWorker::new(
            Arc::new(MockJobProcessor),
            WorkerConfig::new("amqp://127.0.0.1:1", "requests", "responses"),
            health.clone(),
        );

        // The first connect attempt fails, then the backoff wait must see
        // the dead latch and stop instead of spinning
        tokio::time::timeout(Duration::from_secs(10), worker.run(rx))
            .await
            .expect("run should stop once the shutdown sender is gone")
            .unwrap();
        assert!(!health.is_ready());
    }

    #[tokio::test]
    async fn test_completed_handlers_are_reaped_in_one_pass() {
        let mut handlers: JoinSet<()> = JoinSet::new();
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..10_000 {
            let done = Arc::clone(&done);
            handlers.spawn(async move {
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        // On the single-threaded test runtime, once every task has run it
        // has also fully completed and is waiting to be joined
        while done.load(Ordering::SeqCst) < 10_000 {
            tokio::task::yield_now().await;
        }

        QueueWorker::reap_finished(&mut handlers);

        assert!(
            handlers.is_empty(),
            "completed handlers must not be retained, {} left",
            handlers.len()
        );
    }
}
