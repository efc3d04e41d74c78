use crate::{AckDirective, Delivery};
use tracing::{debug, error, warn};

impl AckDirective {
    /// Finalizes the given [`Delivery`] according to this directive. Failures
    /// are logged and swallowed: the caller proceeds to the next delivery
    /// either way.
    pub(crate) async fn apply(self, subscriber: &str, delivery: &Delivery) {
        match self {
            AckDirective::Ack => complete_delivery(subscriber, delivery).await,
            AckDirective::NackRequeue => backwash_delivery(subscriber, delivery).await,
            AckDirective::NackDiscard => abandon_delivery(subscriber, delivery).await,
        }
    }
}

/// **Completes** a [`Delivery`] by calling `ack` on its acker. “Complete” is a
/// form of finalizing an incoming message. A message must be finalized exactly
/// once.
///
/// Failing to complete a delivery is potentially a problem with the application’s
/// logic, so it is logged at the error level.
async fn complete_delivery(subscriber: &str, delivery: &Delivery) {
    match delivery.acker().ack().await {
        Ok(()) => debug!(
            subscriber,
            delivery_tag = delivery.delivery_tag(),
            "Acknowledged an incoming RabbitMQ message",
        ),
        Err(error) => error!(
            alert = true,
            subscriber,
            delivery_tag = delivery.delivery_tag(),
            ?error,
            error_message = %error,
            byte_preview = String::from_utf8_lossy(delivery.bytes()).as_ref(),
            "Failed to complete (acknowledge) an incoming RabbitMQ message",
        ),
    }
}

/// **Backwashes** a [`Delivery`] by calling `nack` on its acker, while
/// requesting to re-queue the message. “Backwash” is a form of finalizing an
/// incoming message. A message must be finalized exactly once.
///
/// A delivery that fails to backwash is eventually re-queued by the broker
/// anyway, once its channel goes away. The failure is logged at the warning
/// level.
async fn backwash_delivery(subscriber: &str, delivery: &Delivery) {
    match delivery.acker().nack(true).await {
        Ok(()) => debug!(
            subscriber,
            delivery_tag = delivery.delivery_tag(),
            "Re-queued an incoming RabbitMQ message",
        ),
        Err(error) => warn!(
            alert = true,
            subscriber,
            delivery_tag = delivery.delivery_tag(),
            ?error,
            error_message = %error,
            byte_preview = String::from_utf8_lossy(delivery.bytes()).as_ref(),
            "Failed to backwash (nack with re-queueing) an incoming RabbitMQ message",
        ),
    }
}

/// **Abandons** a [`Delivery`] by calling `nack` on its acker, without
/// re-queueing the message. The broker routes an abandoned message to the
/// queue’s dead-letter exchange. A message must be finalized exactly once.
///
/// Failing to abandon a delivery is logged at the error level.
async fn abandon_delivery(subscriber: &str, delivery: &Delivery) {
    match delivery.acker().nack(false).await {
        Ok(()) => debug!(
            subscriber,
            delivery_tag = delivery.delivery_tag(),
            "Discarded an incoming RabbitMQ message",
        ),
        Err(error) => error!(
            alert = true,
            subscriber,
            delivery_tag = delivery.delivery_tag(),
            ?error,
            error_message = %error,
            byte_preview = String::from_utf8_lossy(delivery.bytes()).as_ref(),
            "Failed to abandon (nack without re-queueing) an incoming RabbitMQ message",
        ),
    }
}
