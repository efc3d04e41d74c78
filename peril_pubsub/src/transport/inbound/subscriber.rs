use crate::{
    AckDirective, Binding, Broker, BrokerChannel, Decoder, Delivery, DeliveryStream, Handler,
    IntoAckDirective, JsonCodec, Lifecycle, QueueBinder, QueueType, SetupError,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::select;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Shorthand for a [`Subscriber`] that decodes messages using [`JsonCodec`].
pub type JsonSubscriber<T> = Subscriber<JsonCodec<T>>;

/// Consumes messages from a single queue, passing each one through a pre-set
/// [`Decoder`] and then through a [`Handler`], and finalizing it according to
/// the handler’s verdict.
///
/// A subscriber is consumed by [`subscribe`](Subscriber::subscribe), which
/// declares and binds the queue and then starts a background consumption loop.
pub struct Subscriber<D> {
    name: Arc<str>,
    binding: Binding,
    binder: QueueBinder,
    decoder: D,
    lifecycle: Lifecycle,
}

/// A handle on a running consumption loop started by
/// [`subscribe`](Subscriber::subscribe).
///
/// Dropping the subscription does not stop the loop: the loop ends when the
/// delivery stream is closed, or when the subscriber’s [`Lifecycle`] is
/// terminated.
#[derive(Debug)]
pub struct Subscription {
    name: Arc<str>,
    queue: String,
    handle: JoinHandle<()>,
}

/// The state owned by a running consumption loop.
struct Consumption<C, D, H> {
    name: Arc<str>,
    queue: String,
    decoder: D,
    handler: H,
    lifecycle: Lifecycle,
    stream: DeliveryStream,
    // Kept open for as long as the loop runs
    _channel: C,
}

impl<D> Subscriber<D>
where
    D: Decoder,
{
    /// Creates and returns a new [`Subscriber`] for the given [`Binding`] and
    /// [`Decoder`]. The queue is declared by the default [`QueueBinder`], and
    /// the consumption loop is never terminated by a [`Lifecycle`].
    pub fn new(binding: Binding, decoder: D) -> Self {
        let name = Self::compose_name(&binding);

        Self {
            name,
            binding,
            binder: QueueBinder::default(),
            decoder,
            lifecycle: Lifecycle::default(),
        }
    }

    /// Re-creates this subscriber with the given [`QueueBinder`].
    pub fn with_binder(self, binder: QueueBinder) -> Self {
        Self { binder, ..self }
    }

    /// Re-creates this subscriber with the given [`Lifecycle`]. Terminating the
    /// lifecycle stops the consumption loop before it pulls the next delivery.
    pub fn with_lifecycle(self, lifecycle: Lifecycle) -> Self {
        Self { lifecycle, ..self }
    }

    /// Composes a globally unique, human-readable name for this [`Subscriber`].
    fn compose_name(binding: &Binding) -> Arc<str> {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);

        Arc::from(format!(
            "peril:sub:{}:{}",
            binding.queue(),
            COUNTER.fetch_add(1, Ordering::Relaxed),
        ))
    }
}

impl<D> Subscriber<D> {
    /// Reports the name of this [`Subscriber`]. The name doubles as the
    /// consumer tag.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reports the binding consumed by this [`Subscriber`].
    pub fn binding(&self) -> &Binding {
        &self.binding
    }
}

impl<T> Subscriber<JsonCodec<T>>
where
    T: serde::de::DeserializeOwned,
{
    /// A shorthand for calling [`new`](Subscriber::new) with a [`JsonCodec`].
    pub fn new_json(binding: Binding) -> Self {
        Self::new(binding, JsonCodec::default())
    }
}

impl<D> Subscriber<D>
where
    D: Decoder + Send + Sync + 'static,
{
    /// Declares and binds the queue on a fresh channel of the given broker,
    /// starts consuming it with manual acknowledgment, and spawns a background
    /// loop that feeds every delivery to the given [`Handler`].
    ///
    /// For every delivery, the loop:
    ///
    /// - decodes the payload; a payload that fails to decode is logged and
    ///   discarded (nack without re-queueing), and the handler is not invoked,
    /// - invokes the handler with the decoded value,
    /// - finalizes the delivery according to the handler’s
    ///   [`AckDirective`].
    ///
    /// A failure to finalize one delivery is logged and does not stop the loop.
    /// Deliveries are handled strictly one at a time, in arrival order.
    ///
    /// Returns as soon as the loop is started. Setup failures (channel, queue
    /// declaration, queue binding, consume) are returned as a [`SetupError`]
    /// and no loop is started.
    pub async fn subscribe<B, H>(self, broker: &B, handler: H) -> Result<Subscription, SetupError>
    where
        B: Broker + ?Sized,
        H: Handler<D::Result>,
    {
        // Declare and bind the queue on a fresh channel
        let (channel, queue) = self.binder.bind(broker, &self.binding).await?;

        // Initiate consuming of messages
        let stream = match channel.consume(queue.name(), &self.name).await {
            Ok(stream) => stream,
            Err(error) => {
                warn!(
                    alert = true,
                    subscriber = self.name.as_ref(),
                    queue = queue.name(),
                    ?error,
                    error_message = %error,
                    "Failed to start consuming from a RabbitMQ queue",
                );

                return Err(SetupError::Consume {
                    queue: queue.name().to_string(),
                    source: error,
                });
            }
        };

        info!(
            subscriber = self.name.as_ref(),
            queue = queue.name(),
            exchange = self.binding.exchange(),
            routing_key = self.binding.routing_key(),
            "Subscribed to a RabbitMQ queue",
        );

        let consumption = Consumption {
            name: Arc::clone(&self.name),
            queue: queue.name().to_string(),
            decoder: self.decoder,
            handler,
            lifecycle: self.lifecycle,
            stream,
            _channel: channel,
        };

        let handle = tokio::spawn(consumption.run());

        Ok(Subscription {
            name: self.name,
            queue: queue.name().to_string(),
            handle,
        })
    }
}

/// Subscribes the given [`Handler`] to JSON messages of type `T` arriving at
/// the given queue, which is declared with the given [`QueueType`] and bound
/// to the given exchange under the given routing key.
///
/// This is a shorthand for building a [`JsonSubscriber`] and calling
/// [`subscribe`](Subscriber::subscribe) on it.
pub async fn subscribe_json<T, B, H>(
    broker: &B,
    exchange: &str,
    queue: &str,
    routing_key: &str,
    queue_type: QueueType,
    handler: H,
) -> Result<Subscription, SetupError>
where
    T: serde::de::DeserializeOwned + 'static,
    B: Broker + ?Sized,
    H: Handler<T>,
{
    Subscriber::new_json(Binding::new(exchange, queue, routing_key, queue_type))
        .subscribe(broker, handler)
        .await
}

impl<C, D, H> Consumption<C, D, H>
where
    C: BrokerChannel,
    D: Decoder,
    H: Handler<D::Result>,
{
    /// Pulls deliveries until the stream ends or the lifecycle is terminated.
    async fn run(mut self) {
        loop {
            let next = select! {
                biased;
                _ = self.lifecycle.terminated() => {
                    debug!(
                        subscriber = self.name.as_ref(),
                        queue = self.queue.as_str(),
                        "Stopped consuming from a RabbitMQ queue on lifecycle termination",
                    );
                    break;
                }
                next = self.stream.next() => next,
            };

            // Unwrap the outer option
            let delivery = match next {
                Some(Ok(delivery)) => delivery,
                Some(Err(error)) => {
                    warn!(
                        alert = true,
                        subscriber = self.name.as_ref(),
                        ?error,
                        error_message = %error,
                        "Received an error from a RabbitMQ consumer",
                    );
                    continue;
                }
                None => {
                    debug!(
                        subscriber = self.name.as_ref(),
                        queue = self.queue.as_str(),
                        "Ran out of messages on a RabbitMQ consumer",
                    );
                    break;
                }
            };

            // Finalize according to the verdict (an unknown verdict leaves the delivery as is)
            if let Some(directive) = self.resolve(&delivery) {
                directive.apply(&self.name, &delivery).await;
            }
        }
    }

    /// Decodes the given delivery and hands it to the handler, returning the
    /// directive to apply.
    fn resolve(&mut self, delivery: &Delivery) -> Option<AckDirective> {
        let payload = match self.decoder.decode(delivery.bytes()) {
            Ok(payload) => payload,
            Err(error) => {
                error!(
                    alert = true,
                    subscriber = self.name.as_ref(),
                    delivery_tag = delivery.delivery_tag(),
                    ?error,
                    error_message = %error,
                    byte_preview = String::from_utf8_lossy(delivery.bytes()).as_ref(),
                    "Failed to decode an inbound RabbitMQ message",
                );

                return Some(AckDirective::NackDiscard);
            }
        };

        match self.handler.handle(payload).into_ack_directive() {
            Ok(directive) => Some(directive),
            Err(error) => {
                error!(
                    alert = true,
                    subscriber = self.name.as_ref(),
                    delivery_tag = delivery.delivery_tag(),
                    ?error,
                    error_message = %error,
                    "Handler returned an unknown acknowledgment directive; leaving the message unacknowledged",
                );

                None
            }
        }
    }
}

impl Subscription {
    /// Reports the name of the subscriber that started this subscription.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reports the name of the consumed queue.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Reports whether the consumption loop has ended.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the consumption loop without waiting for the delivery stream to
    /// end. A delivery being handled at that moment is left unacknowledged.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Completes once the consumption loop has ended. If the handler panicked,
    /// the panic is resumed on the caller.
    pub async fn closed(self) {
        if let Err(error) = self.handle.await {
            if error.is_panic() {
                std::panic::resume_unwind(error.into_panic());
            }
        }
    }
}
