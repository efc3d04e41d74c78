use peril_pubsub::AckDirective;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::timeout;

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds a handler that forwards every received value into a channel and
/// answers with the given directive, along with the receiving end.
pub fn forwarding_handler<T>(
    directive: AckDirective,
) -> (impl FnMut(T) -> AckDirective + Send + 'static, UnboundedReceiver<T>)
where
    T: Send + 'static,
{
    let (sender, receiver): (UnboundedSender<T>, _) = unbounded_channel();
    let handler = move |value: T| {
        let _ = sender.send(value);
        directive
    };

    (handler, receiver)
}

/// Waits for the next value, or for the timeout.
pub async fn receive_one<T>(receiver: &mut UnboundedReceiver<T>) -> Option<T> {
    timeout(RECEIVE_TIMEOUT, receiver.recv()).await.ok().flatten()
}

/// Asserts that nothing else arrives within a short grace period.
pub async fn assert_quiet<T>(receiver: &mut UnboundedReceiver<T>) {
    let result = timeout(Duration::from_millis(500), receiver.recv()).await;

    assert!(result.is_err(), "expected no further messages");
}
