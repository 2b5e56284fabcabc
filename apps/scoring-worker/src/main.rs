//! Scoring Worker Service - Entry Point
//!
//! Background worker that processes scoring jobs from the RabbitMQ queue.

#[tokio::main]
async fn main() -> eyre::Result<()> {
    scoring_worker::run().await
}
