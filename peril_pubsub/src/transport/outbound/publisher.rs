use crate::{BrokerChannel, Encoder, JsonCodec, SerializationError, TransportError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

/// Shorthand for a [`Publisher`] that encodes values using [`JsonCodec`].
pub type JsonPublisher<T> = Publisher<JsonCodec<T>>;

/// Encodes outgoing values with a pre-set [`Encoder`] and sends them to an
/// exchange on a given [`BrokerChannel`].
///
/// Publishing is fire-and-forget: once the bytes are handed to the channel,
/// the publish is considered done. No confirmation is awaited from the broker
/// and nothing is retried. A message routed to no queue is silently dropped
/// by the broker.
///
/// The publisher owns no channel. The caller supplies one per call and may
/// keep using it afterward. Concurrent publishes on the same channel are
/// serialized by the channel itself.
pub struct Publisher<E> {
    name: Arc<str>,
    encoder: E,
}

/// Represents failure to publish a single value.
#[derive(Error, Debug)]
pub enum PublishingError {
    /// The value could not be encoded. Nothing was sent.
    #[error("failed to encode a message for the RabbitMQ exchange '{exchange}' (routing key '{routing_key}'): {source}")]
    Serialization {
        /// The target exchange.
        exchange: String,
        /// The target routing key.
        routing_key: String,
        /// The underlying encoder error.
        #[source]
        source: SerializationError,
    },

    /// The channel refused to send the encoded bytes.
    #[error("failed to publish a message to the RabbitMQ exchange '{exchange}' (routing key '{routing_key}'): {source}")]
    Transport {
        /// The target exchange.
        exchange: String,
        /// The target routing key.
        routing_key: String,
        /// The underlying transport error.
        #[source]
        source: TransportError,
    },
}

impl<E> Publisher<E> {
    /// Creates and returns a new [`Publisher`] with the given [`Encoder`].
    pub fn new(encoder: E) -> Self {
        Self {
            name: Self::compose_name(),
            encoder,
        }
    }

    /// Composes a globally unique, human-readable name for this [`Publisher`].
    fn compose_name() -> Arc<str> {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        Arc::from(format!(
            "peril:pub:{}",
            COUNTER.fetch_add(1, Ordering::Relaxed),
        ))
    }

    /// Reports the name of this [`Publisher`].
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Publisher<JsonCodec<T>>
where
    T: serde::Serialize,
{
    /// A shorthand for calling [`new`](Publisher::new) with a [`JsonCodec`].
    pub fn new_json() -> Self {
        Self::new(JsonCodec::default())
    }
}

impl<E> Publisher<E>
where
    E: Encoder,
{
    /// Attempts once to encode and publish the given value to the given
    /// exchange under the given routing key, and returns an error as soon as
    /// something goes wrong.
    pub async fn try_publish<C>(
        &self,
        channel: &C,
        exchange: &str,
        routing_key: &str,
        value: &E::Input,
    ) -> Result<(), PublishingError>
    where
        C: BrokerChannel + ?Sized,
    {
        // Encode first (a value that fails to encode is never sent)
        let bytes = match self.encoder.encode(value) {
            Ok(bytes) => bytes,
            Err(error) => {
                error!(
                    alert = true,
                    publisher = self.name.as_ref(),
                    exchange,
                    routing_key,
                    ?error,
                    error_message = %error,
                    "Failed to encode an outgoing RabbitMQ message",
                );

                return Err(PublishingError::Serialization {
                    exchange: exchange.to_string(),
                    routing_key: routing_key.to_string(),
                    source: SerializationError::new(error),
                });
            }
        };

        // Transmit
        if let Err(error) = channel
            .publish(exchange, routing_key, &bytes, self.encoder.content_type())
            .await
        {
            error!(
                alert = true,
                publisher = self.name.as_ref(),
                exchange,
                routing_key,
                ?error,
                error_message = %error,
                byte_preview = String::from_utf8_lossy(&bytes).as_ref(),
                "Failed to publish a message to RabbitMQ",
            );

            return Err(PublishingError::Transport {
                exchange: exchange.to_string(),
                routing_key: routing_key.to_string(),
                source: error,
            });
        }

        debug!(
            publisher = self.name.as_ref(),
            exchange,
            routing_key,
            size = bytes.len(),
            "Published a message to RabbitMQ",
        );

        Ok(())
    }
}

/// Serializes the given value as JSON and publishes it to the given exchange
/// under the given routing key, on the given channel, with content type
/// `application/json`.
pub async fn publish_json<C, T>(
    channel: &C,
    exchange: &str,
    routing_key: &str,
    value: &T,
) -> Result<(), PublishingError>
where
    C: BrokerChannel + ?Sized,
    T: serde::Serialize,
{
    JsonPublisher::<T>::new_json()
        .try_publish(channel, exchange, routing_key, value)
        .await
}

impl PublishingError {
    /// Reports the target exchange.
    pub fn exchange(&self) -> &str {
        match self {
            PublishingError::Serialization { exchange, .. }
            | PublishingError::Transport { exchange, .. } => exchange,
        }
    }

    /// Reports the target routing key.
    pub fn routing_key(&self) -> &str {
        match self {
            PublishingError::Serialization { routing_key, .. }
            | PublishingError::Transport { routing_key, .. } => routing_key,
        }
    }
}
