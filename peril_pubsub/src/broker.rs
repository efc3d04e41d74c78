use crate::TransportError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub mod amqp;

/// The name of the queue declaration argument that designates the exchange
/// receiving messages discarded from the queue.
pub const ARG_DEAD_LETTER_EXCHANGE: &str = "x-dead-letter-exchange";

/// The stream of [`Delivery`]s produced by [consuming](BrokerChannel::consume)
/// a queue. The stream ends when the broker (or the connection) closes it.
pub type DeliveryStream = BoxStream<'static, Result<Delivery, TransportError>>;

/// Represents a connection to a message broker, capable of opening fresh
/// [channels](BrokerChannel).
#[async_trait]
pub trait Broker: Send + Sync {
    /// The type of channel opened on this broker.
    type Channel: BrokerChannel;

    /// Opens a fresh channel on this broker.
    async fn open_channel(&self) -> Result<Self::Channel, TransportError>;
}

/// Represents a single channel on a broker connection, exposing the minimal
/// set of operations needed to declare topology, publish, and consume.
#[async_trait]
pub trait BrokerChannel: Send + Sync + 'static {
    /// Declares a queue with the given flags and arguments. Declaring a queue
    /// that already exists with identical parameters succeeds.
    async fn declare_queue(
        &self,
        name: &str,
        flags: QueueFlags,
        arguments: &QueueArguments,
    ) -> Result<QueueHandle, TransportError>;

    /// Binds the named queue to the given exchange under the given routing key.
    async fn bind_queue(
        &self,
        queue: &str,
        routing_key: &str,
        exchange: &str,
    ) -> Result<(), TransportError>;

    /// Sends the given payload to the given exchange under the given routing
    /// key. Does not wait for any confirmation from the broker.
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
        content_type: &str,
    ) -> Result<(), TransportError>;

    /// Starts consuming the named queue with manual acknowledgment.
    async fn consume(&self, queue: &str, consumer_tag: &str)
    -> Result<DeliveryStream, TransportError>;
}

/// Finalizes a single [`Delivery`] on the broker.
#[async_trait]
pub trait Acker: Send + Sync {
    /// Positively acknowledges the delivery.
    async fn ack(&self) -> Result<(), TransportError>;

    /// Negatively acknowledges the delivery, optionally re-queueing it.
    async fn nack(&self, requeue: bool) -> Result<(), TransportError>;
}

/// The three flags of a queue declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueueFlags {
    /// Whether the queue survives a broker restart.
    pub durable: bool,
    /// Whether the queue is deleted once its last consumer goes away.
    pub auto_delete: bool,
    /// Whether the queue belongs to the declaring connection only.
    pub exclusive: bool,
}

/// The optional arguments of a queue declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueueArguments {
    dead_letter_exchange: Option<Arc<str>>,
}

impl QueueArguments {
    /// Re-creates these arguments with the given dead-letter exchange.
    pub fn with_dead_letter_exchange(self, exchange: impl AsRef<str>) -> Self {
        Self {
            dead_letter_exchange: Some(Arc::from(exchange.as_ref())),
        }
    }

    /// Reports the dead-letter exchange, if any.
    pub fn dead_letter_exchange(&self) -> Option<&str> {
        self.dead_letter_exchange.as_deref()
    }
}

/// Describes a queue as reported back by the broker after a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueHandle {
    name: String,
    message_count: u32,
    consumer_count: u32,
}

impl QueueHandle {
    /// Creates a new queue handle.
    pub fn new(name: impl Into<String>, message_count: u32, consumer_count: u32) -> Self {
        Self {
            name: name.into(),
            message_count,
            consumer_count,
        }
    }

    /// Reports the queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reports how many messages were ready in the queue at declaration time.
    pub fn message_count(&self) -> u32 {
        self.message_count
    }

    /// Reports how many consumers the queue had at declaration time.
    pub fn consumer_count(&self) -> u32 {
        self.consumer_count
    }
}

/// Represents one message handed to a consumer: the payload bytes, a bit of
/// routing metadata, and the [`Acker`] needed to finalize it.
pub struct Delivery {
    delivery_tag: u64,
    exchange: String,
    routing_key: String,
    redelivered: bool,
    content_type: Option<String>,
    bytes: Vec<u8>,
    acker: Box<dyn Acker>,
}

impl Delivery {
    /// Creates a new delivery with the given tag, payload, and acker. The
    /// routing metadata is left empty.
    pub fn new(delivery_tag: u64, bytes: Vec<u8>, acker: impl Acker + 'static) -> Self {
        Self {
            delivery_tag,
            exchange: String::new(),
            routing_key: String::new(),
            redelivered: false,
            content_type: None,
            bytes,
            acker: Box::new(acker),
        }
    }

    /// Re-creates this delivery with the given exchange and routing key.
    pub fn with_route(self, exchange: impl Into<String>, routing_key: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            routing_key: routing_key.into(),
            ..self
        }
    }

    /// Re-creates this delivery with the given redelivery flag.
    pub fn with_redelivered(self, redelivered: bool) -> Self {
        Self {
            redelivered,
            ..self
        }
    }

    /// Re-creates this delivery with the given content type.
    pub fn with_content_type(self, content_type: Option<String>) -> Self {
        Self {
            content_type,
            ..self
        }
    }
}

impl Delivery {
    /// Exposes the delivery tag.
    pub fn delivery_tag(&self) -> u64 {
        self.delivery_tag
    }

    /// Exposes the exchange the message was originally published to.
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// Exposes the routing key the message was originally published with.
    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    /// Exposes the redelivery flag.
    pub fn is_redelivered(&self) -> bool {
        self.redelivered
    }

    /// Exposes the content type, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Exposes the payload bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Exposes the acker of this delivery.
    pub fn acker(&self) -> &dyn Acker {
        self.acker.as_ref()
    }
}

/// Omits the acker and the payload from the debug representation.
impl Debug for Delivery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("delivery_tag", &self.delivery_tag)
            .field("exchange", &self.exchange)
            .field("routing_key", &self.routing_key)
            .field("redelivered", &self.redelivered)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}
