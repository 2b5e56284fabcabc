//! Response publishing.

use lapin::options::BasicPublishOptions;
use lapin::{BasicProperties, Channel};
use tracing::debug;

use crate::error::WorkerError;
use crate::message::ScoreResponse;

/// Publishes scoring responses to the response queue.
///
/// Cheap to clone; every delivery handler gets its own copy.
#[derive(Clone)]
pub struct ResponsePublisher {
    channel: Channel,
    queue: String,
}

impl ResponsePublisher {
    /// Create a publisher bound to a channel and response queue.
    pub fn new(channel: Channel, queue: impl Into<String>) -> Self {
        Self {
            channel,
            queue: queue.into(),
        }
    }

    /// Publish a response as persistent JSON and wait for the broker confirm.
    pub async fn publish(&self, response: &ScoreResponse) -> Result<(), WorkerError> {
        let payload = serde_json::to_vec(response)?;

        let confirm = self
            .channel
            .basic_publish(
                "", // Default exchange, routing key = queue name
                &self.queue,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type("application/json".into()),
            )
            .await?;

        confirm.await?;

        debug!(
            request_id = %response.request_id,
            queue = %self.queue,
            "Response published"
        );
        Ok(())
    }
}
