use crate::QueueType;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Defines the topology needed for consuming: a queue with a lifetime policy,
/// bound to an exchange under a routing key.
///
/// Declaring the same binding any number of times is harmless. Declaring a
/// binding whose queue already exists with a different [`QueueType`] is a
/// configuration error, reported by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    exchange: Arc<str>,
    queue: Arc<str>,
    routing_key: Arc<str>,
    queue_type: QueueType,
}

impl Binding {
    /// Creates a new binding.
    pub fn new(
        exchange: impl AsRef<str>,
        queue: impl AsRef<str>,
        routing_key: impl AsRef<str>,
        queue_type: QueueType,
    ) -> Self {
        Self {
            exchange: Arc::from(exchange.as_ref()),
            queue: Arc::from(queue.as_ref()),
            routing_key: Arc::from(routing_key.as_ref()),
            queue_type,
        }
    }

    /// Creates a binding for a queue that belongs to a single consumer,
    /// following the `<prefix>.<identity>` naming convention. The routing key
    /// is the bare prefix.
    pub fn exclusive(exchange: impl AsRef<str>, prefix: &str, identity: &str) -> Self {
        Self::new(
            exchange,
            format!("{}.{}", prefix, identity),
            prefix,
            QueueType::Transient,
        )
    }

    /// Creates a binding for a durable queue shared between consumers, named
    /// after the given prefix and bound with the `<prefix>.*` wildcard key.
    pub fn shared(exchange: impl AsRef<str>, prefix: &str) -> Self {
        Self::new(exchange, prefix, format!("{}.*", prefix), QueueType::Durable)
    }
}

impl Binding {
    /// Reports the exchange name.
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// Reports the queue name.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Reports the routing key.
    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    /// Reports the queue lifetime policy.
    pub fn queue_type(&self) -> QueueType {
        self.queue_type
    }
}

impl Display for Binding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -[{}]-> {} ({})",
            self.exchange, self.routing_key, self.queue, self.queue_type,
        )
    }
}
