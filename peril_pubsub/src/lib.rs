#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// Exposes an application configuration section.
mod config;
pub use self::config::PubSubConfig;

/// Exposes a handle for defining a set of connection credentials.
mod handle;
pub use self::handle::{DsnChunks, Handle};

/// Exposes machinery for establishing a connection to a RabbitMQ cluster.
mod connector;
pub use self::connector::Connector;

/// Exposes the broker capability consumed by this crate, along with its
/// `lapin`-backed implementation.
mod broker;
pub use self::broker::amqp::{LapinAcker, LapinBroker, LapinChannel};
pub use self::broker::{
    Acker, Broker, BrokerChannel, Delivery, DeliveryStream, QueueArguments, QueueFlags,
    QueueHandle, ARG_DEAD_LETTER_EXCHANGE,
};

/// Exposes the shared error types.
mod error;
pub use self::error::{SerializationError, TransportError};

/// Exposes the lifecycle token that long-running tasks observe.
mod lifecycle;
pub use self::lifecycle::Lifecycle;

/// Exposes the queue topology: bindings and the binder that declares them.
mod routing {
    pub mod binder;
    pub mod binding;
}
pub use self::routing::binder::{
    DeclarationError, DeclarationStage, QueueBinder, SetupError, DEFAULT_DEAD_LETTER_EXCHANGE,
};
pub use self::routing::binding::Binding;

/// Exposes machinery for transporting incoming and outgoing messages.
mod transport {
    pub mod codec;
    pub mod inbound;
    pub mod outbound;
}

// Re-export codec types
pub use self::transport::codec::{
    Decoder, Encoder, JsonCodec, StringDecoder, CONTENT_TYPE_JSON, CONTENT_TYPE_TEXT,
};

// Re-export inbound types
pub use self::transport::inbound::handler::Handler;
pub use self::transport::inbound::subscriber::{
    subscribe_json, JsonSubscriber, Subscriber, Subscription,
};

// Re-export outbound types
pub use self::transport::outbound::publisher::{
    publish_json, JsonPublisher, Publisher, PublishingError,
};

/// Exposes the domain enumerations that encode queue policy and delivery
/// outcomes.
mod repr {
    pub mod ack;
    pub mod queue;
}
pub use self::repr::ack::{AckDirective, IntoAckDirective, UnknownAckDirective};
pub use self::repr::queue::QueueType;

/// Exposes an in-memory broker for exercising publishers and subscribers
/// without a live RabbitMQ cluster.
#[cfg(any(test, feature = "testing"))]
pub mod testing;
