//! Broker session establishment and teardown.
//!
//! A [`Session`] is one fully prepared attachment to the broker: a named
//! connection, a channel with publisher confirms enabled, the prefetch
//! applied, both durable queues declared, and a consumer on the request
//! queue. Sessions are built whole or not at all; a failure at any step
//! surfaces as one error and the worker retries from scratch.

use lapin::options::{
    BasicCancelOptions, BasicConsumeOptions, BasicQosOptions, ConfirmSelectOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, Consumer};
use tracing::debug;

use crate::config::WorkerConfig;
use crate::error::WorkerError;

/// One live broker attachment.
pub(crate) struct Session {
    pub(crate) connection: Connection,
    pub(crate) channel: Channel,
    pub(crate) consumer_tag: String,
}

impl Session {
    /// Connect and prepare the channel for consuming.
    ///
    /// The consumer is returned separately so the caller can poll it while
    /// still borrowing the session for liveness checks.
    pub(crate) async fn establish(config: &WorkerConfig) -> Result<(Self, Consumer), WorkerError> {
        let connection = Connection::connect(
            &config.amqp_url,
            ConnectionProperties::default()
                .with_connection_name(config.connection_name.clone().into()),
        )
        .await?;

        let channel = connection.create_channel().await?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;
        channel
            .basic_qos(config.prefetch, BasicQosOptions::default())
            .await?;

        let declare = QueueDeclareOptions {
            durable: true,
            ..Default::default()
        };
        channel
            .queue_declare(&config.request_queue, declare, FieldTable::default())
            .await?;
        channel
            .queue_declare(&config.response_queue, declare, FieldTable::default())
            .await?;

        let consumer = channel
            .basic_consume(
                &config.request_queue,
                &config.consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        Ok((
            Self {
                connection,
                channel,
                consumer_tag: config.consumer_tag.clone(),
            },
            consumer,
        ))
    }

    /// Whether both the connection and the channel are still open.
    pub(crate) fn is_open(&self) -> bool {
        self.connection.status().connected() && self.channel.status().connected()
    }

    /// Stop the broker from sending new deliveries.
    ///
    /// In-flight deliveries keep their ackers and can still be settled.
    pub(crate) async fn cancel_consumer(&self) -> Result<(), WorkerError> {
        self.channel
            .basic_cancel(&self.consumer_tag, BasicCancelOptions::default())
            .await?;
        Ok(())
    }

    /// Orderly teardown of the channel and connection.
    ///
    /// Close failures are logged and swallowed; the session is gone either
    /// way and the caller has nothing useful to do with the error.
    pub(crate) async fn close(self) {
        if let Err(e) = self.channel.close(200, "worker shutdown").await {
            debug!(error = %e, "Channel close failed");
        }
        if let Err(e) = self.connection.close(200, "worker shutdown").await {
            debug!(error = %e, "Connection close failed");
        }
    }
}
