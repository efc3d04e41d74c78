//! An in-memory stand-in for a RabbitMQ broker.
//!
//! [`MemoryBroker`] implements [`Broker`] closely enough to exercise queue
//! declarations, bindings, publishing, consuming, and acknowledgment without a
//! live cluster. Every exchange routes by topic-style matching (`*` matches
//! exactly one word, `#` matches zero or more words), which also covers exact
//! routing keys on direct exchanges.
//!
//! Known simplifications:
//!
//! - a queue accepts a single consumer at a time,
//! - re-queued deliveries are recorded, not redelivered,
//! - exchanges are never declared; binding to any exchange succeeds unless the
//!   exchange is explicitly [rejected](MemoryBroker::with_rejected_exchange).

use crate::{
    Acker, Broker, BrokerChannel, Delivery, DeliveryStream, QueueArguments, QueueFlags,
    QueueHandle, TransportError,
};
use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// An in-memory [`Broker`]. All clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    state: Arc<Mutex<State>>,
}

/// A channel opened on a [`MemoryBroker`].
pub struct MemoryChannel {
    state: Arc<Mutex<State>>,
}

/// Records the finalization of a single delivery on a [`MemoryBroker`].
struct MemoryAcker {
    delivery_tag: u64,
    state: Weak<Mutex<State>>,
}

/// A queue binding recorded by a [`MemoryBroker`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordedBinding {
    /// The bound queue.
    pub queue: String,
    /// The binding key.
    pub routing_key: String,
    /// The exchange the queue is bound to.
    pub exchange: String,
}

/// A message published to a [`MemoryBroker`], whether routed or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    /// The target exchange.
    pub exchange: String,
    /// The routing key.
    pub routing_key: String,
    /// The content type.
    pub content_type: String,
    /// The payload bytes.
    pub payload: Vec<u8>,
}

#[derive(Default)]
struct State {
    closed: bool,
    fail_acks: bool,
    rejected_exchanges: HashSet<String>,
    channels_opened: usize,
    next_delivery_tag: u64,
    next_generated_name: u64,
    queues: HashMap<String, MemoryQueue>,
    bindings: Vec<RecordedBinding>,
    published: Vec<PublishedMessage>,
    acks: Vec<u64>,
    nacks: Vec<(u64, bool)>,
}

struct MemoryQueue {
    flags: QueueFlags,
    arguments: QueueArguments,
    sender: Option<UnboundedSender<Delivery>>,
    receiver: Option<UnboundedReceiver<Delivery>>,
    consumer_tag: Option<String>,
    routed: usize,
}

impl MemoryBroker {
    /// Creates a new, empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-creates this broker so that binding any queue to the given exchange
    /// fails, as if the exchange did not exist.
    pub fn with_rejected_exchange(self, exchange: impl Into<String>) -> Self {
        self.state.lock().rejected_exchanges.insert(exchange.into());

        self
    }

    /// Makes every subsequent `ack` and `nack` fail (or succeed again).
    pub fn fail_acks(&self, fail: bool) {
        self.state.lock().fail_acks = fail;
    }

    /// Closes this broker: opening channels and publishing start failing, and
    /// every delivery stream ends once its buffered deliveries are drained.
    pub fn close(&self) {
        let mut state = self.state.lock();

        state.closed = true;
        for queue in state.queues.values_mut() {
            queue.sender = None;
        }
    }

    /// Places the given bytes directly into the named queue, bypassing
    /// exchanges and encoders. Does nothing if no such queue is declared.
    pub fn inject(&self, queue: &str, bytes: Vec<u8>) {
        let mut state = self.state.lock();
        let delivery = state.make_delivery(&self.state, "", queue, "text/plain", bytes);

        if let Some(queue) = state.queues.get_mut(queue) {
            queue.push(delivery);
        }
    }

    /// Detaches the consumer from the named queue, so that it may be consumed
    /// again. Buffered deliveries are dropped.
    pub fn release(&self, queue: &str) {
        if let Some(queue) = self.state.lock().queues.get_mut(queue) {
            let (sender, receiver) = unbounded_channel();
            queue.sender = Some(sender);
            queue.receiver = Some(receiver);
            queue.consumer_tag = None;
        }
    }
}

impl MemoryBroker {
    /// Reports the flags the named queue was declared with.
    pub fn queue_flags(&self, queue: &str) -> Option<QueueFlags> {
        self.state.lock().queues.get(queue).map(|queue| queue.flags)
    }

    /// Reports the arguments the named queue was declared with.
    pub fn queue_arguments(&self, queue: &str) -> Option<QueueArguments> {
        self.state
            .lock()
            .queues
            .get(queue)
            .map(|queue| queue.arguments.clone())
    }

    /// Reports the tag of the consumer currently attached to the named queue.
    pub fn consumer_tag(&self, queue: &str) -> Option<String> {
        self.state
            .lock()
            .queues
            .get(queue)
            .and_then(|queue| queue.consumer_tag.clone())
    }

    /// Reports how many published messages were routed into the named queue.
    pub fn routed(&self, queue: &str) -> usize {
        self.state
            .lock()
            .queues
            .get(queue)
            .map_or(0, |queue| queue.routed)
    }

    /// Reports all distinct bindings, in order of first declaration.
    pub fn bindings(&self) -> Vec<RecordedBinding> {
        self.state.lock().bindings.clone()
    }

    /// Reports all published messages, in order of publishing.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.state.lock().published.clone()
    }

    /// Reports the tags of all positively acknowledged deliveries.
    pub fn acks(&self) -> Vec<u64> {
        self.state.lock().acks.clone()
    }

    /// Reports the tags and `requeue` flags of all negatively acknowledged
    /// deliveries.
    pub fn nacks(&self) -> Vec<(u64, bool)> {
        self.state.lock().nacks.clone()
    }

    /// Reports how many channels were opened on this broker.
    pub fn channels_opened(&self) -> usize {
        self.state.lock().channels_opened
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    type Channel = MemoryChannel;

    async fn open_channel(&self) -> Result<Self::Channel, TransportError> {
        let mut state = self.state.lock();

        if state.closed {
            return Err(TransportError::new("connection is closed"));
        }
        state.channels_opened += 1;

        Ok(MemoryChannel {
            state: Arc::clone(&self.state),
        })
    }
}

#[async_trait]
impl BrokerChannel for MemoryChannel {
    async fn declare_queue(
        &self,
        name: &str,
        flags: QueueFlags,
        arguments: &QueueArguments,
    ) -> Result<QueueHandle, TransportError> {
        let mut state = self.state.lock();
        state.ensure_open()?;

        // An empty name asks the broker to generate one
        let name = if name.is_empty() {
            state.next_generated_name += 1;
            format!("amq.gen-{}", state.next_generated_name)
        } else {
            name.to_string()
        };

        if let Some(existing) = state.queues.get(&name) {
            if existing.flags != flags || existing.arguments != *arguments {
                return Err(TransportError::new(format!(
                    "PRECONDITION_FAILED - inequivalent arg for queue '{}'",
                    name,
                )));
            }

            let consumer_count = usize::from(existing.consumer_tag.is_some()) as u32;
            return Ok(QueueHandle::new(name, 0, consumer_count));
        }

        let (sender, receiver) = unbounded_channel();
        state.queues.insert(
            name.clone(),
            MemoryQueue {
                flags,
                arguments: arguments.clone(),
                sender: Some(sender),
                receiver: Some(receiver),
                consumer_tag: None,
                routed: 0,
            },
        );

        Ok(QueueHandle::new(name, 0, 0))
    }

    async fn bind_queue(
        &self,
        queue: &str,
        routing_key: &str,
        exchange: &str,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.ensure_open()?;

        if state.rejected_exchanges.contains(exchange) {
            return Err(TransportError::new(format!(
                "NOT_FOUND - no exchange '{}'",
                exchange,
            )));
        }
        if !state.queues.contains_key(queue) {
            return Err(TransportError::new(format!(
                "NOT_FOUND - no queue '{}'",
                queue,
            )));
        }

        let binding = RecordedBinding {
            queue: queue.to_string(),
            routing_key: routing_key.to_string(),
            exchange: exchange.to_string(),
        };
        if !state.bindings.contains(&binding) {
            state.bindings.push(binding);
        }

        Ok(())
    }

    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
        content_type: &str,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.ensure_open()?;

        state.published.push(PublishedMessage {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            content_type: content_type.to_string(),
            payload: payload.to_vec(),
        });

        let targets: Vec<String> = state
            .bindings
            .iter()
            .filter(|binding| binding.exchange == exchange)
            .filter(|binding| topic_matches(&binding.routing_key, routing_key))
            .map(|binding| binding.queue.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        for target in targets {
            let delivery = state.make_delivery(
                &self.state,
                exchange,
                routing_key,
                content_type,
                payload.to_vec(),
            );
            if let Some(queue) = state.queues.get_mut(&target) {
                queue.routed += 1;
                queue.push(delivery);
            }
        }

        Ok(())
    }

    async fn consume(
        &self,
        queue: &str,
        consumer_tag: &str,
    ) -> Result<DeliveryStream, TransportError> {
        let mut state = self.state.lock();
        state.ensure_open()?;

        let queue = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| TransportError::new(format!("NOT_FOUND - no queue '{}'", queue)))?;
        let receiver = queue.receiver.take().ok_or_else(|| {
            TransportError::new("RESOURCE_LOCKED - queue already has a consumer")
        })?;
        queue.consumer_tag = Some(consumer_tag.to_string());

        let stream = futures::stream::unfold(receiver, |mut receiver| async move {
            receiver
                .recv()
                .await
                .map(|delivery| (Ok(delivery), receiver))
        });

        Ok(stream.boxed())
    }
}

#[async_trait]
impl Acker for MemoryAcker {
    async fn ack(&self) -> Result<(), TransportError> {
        let state = self.state()?;
        let mut state = state.lock();

        if state.fail_acks {
            return Err(TransportError::new("channel is closed"));
        }
        state.acks.push(self.delivery_tag);

        Ok(())
    }

    async fn nack(&self, requeue: bool) -> Result<(), TransportError> {
        let state = self.state()?;
        let mut state = state.lock();

        if state.fail_acks {
            return Err(TransportError::new("channel is closed"));
        }
        state.nacks.push((self.delivery_tag, requeue));

        Ok(())
    }
}

impl MemoryAcker {
    fn state(&self) -> Result<Arc<Mutex<State>>, TransportError> {
        self.state
            .upgrade()
            .ok_or_else(|| TransportError::new("broker is gone"))
    }
}

impl State {
    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::new("channel is closed"));
        }

        Ok(())
    }

    fn make_delivery(
        &mut self,
        state: &Arc<Mutex<State>>,
        exchange: &str,
        routing_key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Delivery {
        self.next_delivery_tag += 1;
        let acker = MemoryAcker {
            delivery_tag: self.next_delivery_tag,
            state: Arc::downgrade(state),
        };

        Delivery::new(self.next_delivery_tag, bytes, acker)
            .with_route(exchange, routing_key)
            .with_content_type(Some(content_type.to_string()))
    }
}

impl MemoryQueue {
    fn push(&mut self, delivery: Delivery) {
        if let Some(sender) = &self.sender {
            // A dropped receiver means the consumer went away; the message is lost
            let _ = sender.send(delivery);
        }
    }
}

/// Matches a routing key against a binding key, with `*` standing for exactly
/// one word and `#` standing for zero or more words.
fn topic_matches(pattern: &str, key: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let key: Vec<&str> = key.split('.').collect();

    words_match(&pattern, &key)
}

fn words_match(pattern: &[&str], key: &[&str]) -> bool {
    match (pattern.split_first(), key.split_first()) {
        (None, None) => true,
        (Some((&"#", rest)), _) => {
            words_match(rest, key) || (!key.is_empty() && words_match(pattern, &key[1..]))
        }
        (Some((&"*", rest)), Some((_, key_rest))) => words_match(rest, key_rest),
        (Some((word, rest)), Some((key_word, key_rest))) => {
            word == key_word && words_match(rest, key_rest)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueueType;

    #[test]
    fn topic_matching() {
        assert!(topic_matches("pause", "pause"));
        assert!(!topic_matches("pause", "pauses"));
        assert!(topic_matches("game_logs.*", "game_logs.alice"));
        assert!(!topic_matches("game_logs.*", "game_logs"));
        assert!(!topic_matches("game_logs.*", "game_logs.alice.extra"));
        assert!(topic_matches("army_moves.#", "army_moves"));
        assert!(topic_matches("army_moves.#", "army_moves.alice.europe"));
        assert!(topic_matches("#", "anything.at.all"));
    }

    #[tokio::test]
    async fn acker_outliving_broker() {
        // Given
        let broker = MemoryBroker::new();
        let channel = broker.open_channel().await.unwrap();
        channel
            .declare_queue("orphan", QueueType::Durable.flags(), &QueueArguments::default())
            .await
            .unwrap();
        broker.inject("orphan", b"payload".to_vec());
        let mut stream = channel.consume("orphan", "test").await.unwrap();
        let delivery = stream.next().await.unwrap().unwrap();

        // When
        drop(stream);
        drop(channel);
        drop(broker);
        let result = delivery.acker().ack().await;

        // Then
        assert!(result.is_err());
    }
}
