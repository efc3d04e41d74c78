use crate::{
    Acker, ARG_DEAD_LETTER_EXCHANGE, Broker, BrokerChannel, Delivery, DeliveryStream,
    QueueArguments, QueueFlags, QueueHandle, TransportError,
};
use async_trait::async_trait;
use futures::StreamExt;
use lapin::acker::Acker as InnerAcker;
use lapin::message::Delivery as InnerDelivery;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
    QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::{AMQPValue, FieldTable, LongString, ShortString};
use lapin::{BasicProperties, Channel, Connection};
use std::sync::Arc;

/// Implements [`Broker`] on top of a `lapin` [`Connection`].
///
/// The broker is cheaply clone-able: all clones share the same connection.
#[derive(Clone)]
pub struct LapinBroker {
    connection: Arc<Connection>,
}

/// Implements [`BrokerChannel`] on top of a `lapin` [`Channel`].
#[derive(Clone)]
pub struct LapinChannel {
    inner: Channel,
}

/// Implements [`Acker`] on top of a `lapin` acker.
pub struct LapinAcker {
    inner: InnerAcker,
}

impl LapinBroker {
    /// Wraps the given connection.
    pub fn new(connection: Connection) -> Self {
        Self {
            connection: Arc::new(connection),
        }
    }

    /// Exposes the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Closes the underlying connection. Every channel opened on it stops
    /// working, and every delivery stream consumed on it ends.
    pub async fn close(&self) -> Result<(), TransportError> {
        self.connection.close(200, "Closing connection").await?;

        Ok(())
    }
}

impl LapinChannel {
    /// Exposes the underlying channel.
    pub fn inner(&self) -> &Channel {
        &self.inner
    }
}

impl From<Channel> for LapinChannel {
    fn from(inner: Channel) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Broker for LapinBroker {
    type Channel = LapinChannel;

    async fn open_channel(&self) -> Result<Self::Channel, TransportError> {
        let channel = self.connection.create_channel().await?;

        Ok(LapinChannel::from(channel))
    }
}

#[async_trait]
impl BrokerChannel for LapinChannel {
    async fn declare_queue(
        &self,
        name: &str,
        flags: QueueFlags,
        arguments: &QueueArguments,
    ) -> Result<QueueHandle, TransportError> {
        let queue = self
            .inner
            .queue_declare(
                name,
                QueueDeclareOptions {
                    passive: false,
                    durable: flags.durable,
                    exclusive: flags.exclusive,
                    auto_delete: flags.auto_delete,
                    nowait: false,
                },
                field_table(arguments),
            )
            .await?;

        Ok(QueueHandle::new(
            queue.name().as_str(),
            queue.message_count(),
            queue.consumer_count(),
        ))
    }

    async fn bind_queue(
        &self,
        queue: &str,
        routing_key: &str,
        exchange: &str,
    ) -> Result<(), TransportError> {
        self.inner
            .queue_bind(
                queue,
                exchange,
                routing_key,
                QueueBindOptions { nowait: false },
                FieldTable::default(),
            )
            .await?;

        Ok(())
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
        content_type: &str,
    ) -> Result<(), TransportError> {
        let properties = BasicProperties::default().with_content_type(ShortString::from(content_type));

        // Fire and forget: the returned publisher confirm is never awaited
        let _confirm = self
            .inner
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions {
                    mandatory: false,
                    immediate: false,
                },
                payload,
                properties,
            )
            .await?;

        Ok(())
    }

    async fn consume(
        &self,
        queue: &str,
        consumer_tag: &str,
    ) -> Result<DeliveryStream, TransportError> {
        let consumer = self
            .inner
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions {
                    no_local: false,
                    no_ack: false,
                    exclusive: false,
                    nowait: false,
                },
                FieldTable::default(),
            )
            .await?;

        let stream = consumer.map(|result| match result {
            Ok(delivery) => Ok(convert_delivery(delivery)),
            Err(error) => Err(TransportError::from(error)),
        });

        Ok(stream.boxed())
    }
}

#[async_trait]
impl Acker for LapinAcker {
    async fn ack(&self) -> Result<(), TransportError> {
        self.inner.ack(BasicAckOptions { multiple: false }).await?;

        Ok(())
    }

    async fn nack(&self, requeue: bool) -> Result<(), TransportError> {
        self.inner
            .nack(BasicNackOptions {
                multiple: false,
                requeue,
            })
            .await?;

        Ok(())
    }
}

/// Translates the given [`QueueArguments`] into a `lapin` [`FieldTable`].
fn field_table(arguments: &QueueArguments) -> FieldTable {
    let mut table = FieldTable::default();

    if let Some(exchange) = arguments.dead_letter_exchange() {
        table.insert(
            ShortString::from(ARG_DEAD_LETTER_EXCHANGE),
            AMQPValue::LongString(LongString::from(exchange)),
        );
    }

    table
}

/// Peels the given `lapin` delivery into a [`Delivery`].
fn convert_delivery(delivery: InnerDelivery) -> Delivery {
    let InnerDelivery {
        delivery_tag,
        exchange,
        routing_key,
        redelivered,
        properties,
        data,
        acker,
        ..
    } = delivery;
    let content_type = properties
        .content_type()
        .as_ref()
        .map(|value| value.as_str().to_owned());

    Delivery::new(delivery_tag, data, LapinAcker { inner: acker })
        .with_route(exchange.as_str(), routing_key.as_str())
        .with_redelivered(redelivered)
        .with_content_type(content_type)
}
