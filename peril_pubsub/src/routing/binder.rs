use crate::{
    Binding, Broker, BrokerChannel, QueueArguments, QueueHandle, QueueType, TransportError,
};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// The dead-letter exchange attached to declared queues unless configured
/// otherwise.
pub const DEFAULT_DEAD_LETTER_EXCHANGE: &str = "peril_dlx";

/// Declares queues and binds them to exchanges.
///
/// Every call to [`bind`](QueueBinder::bind) opens a fresh channel, declares
/// the queue with the flags implied by its [`QueueType`], attaches the
/// dead-letter exchange of this binder, and binds the queue to the exchange.
/// The broker-side state outlives the call according to the queue type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueBinder {
    dead_letter_exchange: Arc<str>,
}

/// Identifies which of the two declarations the broker rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationStage {
    /// Declaring the queue.
    Declare,
    /// Binding the queue to the exchange.
    Bind,
}

/// Represents the broker rejecting a queue declaration or a queue binding
/// (e.g., a queue by that name already exists with a different configuration).
///
/// The channel on which the rejected declaration was issued is unusable
/// afterward, and is never handed out.
#[derive(Error, Debug)]
#[error("failed to {stage} the RabbitMQ queue '{queue}' on the exchange '{exchange}': {source}")]
pub struct DeclarationError {
    stage: DeclarationStage,
    queue: String,
    exchange: String,
    #[source]
    source: TransportError,
}

/// Represents failure to set up consuming from a queue.
#[derive(Error, Debug)]
pub enum SetupError {
    /// A fresh channel could not be opened.
    #[error("failed to open a RabbitMQ channel: {0}")]
    Channel(#[source] TransportError),

    /// The queue declaration or binding was rejected.
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    /// Consuming from the declared queue could not be started.
    #[error("failed to start consuming from the RabbitMQ queue '{queue}': {source}")]
    Consume {
        /// The queue that was to be consumed.
        queue: String,
        /// The underlying transport error.
        #[source]
        source: TransportError,
    },
}

impl QueueBinder {
    /// Creates a binder that attaches the given dead-letter exchange to every
    /// declared queue.
    pub fn new(dead_letter_exchange: impl AsRef<str>) -> Self {
        Self {
            dead_letter_exchange: Arc::from(dead_letter_exchange.as_ref()),
        }
    }

    /// Reports the dead-letter exchange attached by this binder.
    pub fn dead_letter_exchange(&self) -> &str {
        &self.dead_letter_exchange
    }

    /// Returns the declaration arguments attached by this binder.
    pub fn arguments(&self) -> QueueArguments {
        QueueArguments::default().with_dead_letter_exchange(self.dead_letter_exchange.as_ref())
    }
}

impl Default for QueueBinder {
    fn default() -> Self {
        Self::new(DEFAULT_DEAD_LETTER_EXCHANGE)
    }
}

impl QueueBinder {
    /// Opens a fresh channel on the given broker and issues the declarations
    /// described by the given [`Binding`]. Returns the channel along with the
    /// declared queue.
    pub async fn bind<B>(
        &self,
        broker: &B,
        binding: &Binding,
    ) -> Result<(B::Channel, QueueHandle), SetupError>
    where
        B: Broker + ?Sized,
    {
        // Open a channel dedicated to this binding
        let channel = broker.open_channel().await.map_err(SetupError::Channel)?;

        // Declare and bind (the channel is dropped on failure)
        let queue = self.declare(&channel, binding).await?;

        Ok((channel, queue))
    }

    /// A shorthand for calling [`bind`](QueueBinder::bind) with a [`Binding`]
    /// assembled from the given parts.
    pub async fn declare_and_bind<B>(
        &self,
        broker: &B,
        exchange: &str,
        queue: &str,
        routing_key: &str,
        queue_type: QueueType,
    ) -> Result<(B::Channel, QueueHandle), SetupError>
    where
        B: Broker + ?Sized,
    {
        self.bind(broker, &Binding::new(exchange, queue, routing_key, queue_type))
            .await
    }

    /// Declares the queue and binds it to the exchange on the given channel.
    pub(crate) async fn declare<C>(
        &self,
        channel: &C,
        binding: &Binding,
    ) -> Result<QueueHandle, DeclarationError>
    where
        C: BrokerChannel + ?Sized,
    {
        // Declare the queue
        let queue = channel
            .declare_queue(
                binding.queue(),
                binding.queue_type().flags(),
                &self.arguments(),
            )
            .await
            .map_err(|error| self.reject(DeclarationStage::Declare, binding, error))?;

        // Bind the queue to the exchange (the broker may have named the queue)
        channel
            .bind_queue(queue.name(), binding.routing_key(), binding.exchange())
            .await
            .map_err(|error| self.reject(DeclarationStage::Bind, binding, error))?;

        debug!(
            queue = queue.name(),
            exchange = binding.exchange(),
            routing_key = binding.routing_key(),
            queue_type = %binding.queue_type(),
            dead_letter_exchange = self.dead_letter_exchange.as_ref(),
            "Declared and bound a RabbitMQ queue",
        );

        Ok(queue)
    }

    /// Reports and wraps a rejected declaration.
    fn reject(
        &self,
        stage: DeclarationStage,
        binding: &Binding,
        error: TransportError,
    ) -> DeclarationError {
        warn!(
            alert = true,
            queue = binding.queue(),
            exchange = binding.exchange(),
            routing_key = binding.routing_key(),
            %stage,
            ?error,
            error_message = %error,
            "Failed to declare or bind a RabbitMQ queue",
        );

        DeclarationError {
            stage,
            queue: binding.queue().to_string(),
            exchange: binding.exchange().to_string(),
            source: error,
        }
    }
}

impl DeclarationError {
    /// Reports which declaration was rejected.
    pub fn stage(&self) -> DeclarationStage {
        self.stage
    }

    /// Reports the queue name.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Reports the exchange name.
    pub fn exchange(&self) -> &str {
        &self.exchange
    }
}

impl Display for DeclarationStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclarationStage::Declare => f.write_str("declare"),
            DeclarationStage::Bind => f.write_str("bind"),
        }
    }
}
