use crate::IntoAckDirective;

/// Receives decoded messages from a [`Subscriber`](crate::Subscriber) and
/// decides the fate of each one.
///
/// A handler is invoked once per successfully decoded delivery, sequentially,
/// and never for a delivery that failed to decode. The returned
/// [`Outcome`](Handler::Outcome) is converted into an
/// [`AckDirective`](crate::AckDirective) and applied to the delivery before the
/// next one is handled.
///
/// Any `FnMut(T) -> R` closure is a handler, as long as `R` converts into a
/// directive.
pub trait Handler<T>: Send + 'static {
    /// The type returned for each handled message.
    type Outcome: IntoAckDirective;

    /// Handles the given decoded message.
    fn handle(&mut self, payload: T) -> Self::Outcome;
}

impl<T, F, R> Handler<T> for F
where
    F: FnMut(T) -> R + Send + 'static,
    R: IntoAckDirective,
{
    type Outcome = R;

    fn handle(&mut self, payload: T) -> Self::Outcome {
        self(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AckDirective;
    use pretty_assertions::assert_eq;

    #[test]
    fn stateful_closure() {
        // Given
        let mut seen = Vec::new();
        let mut handler = move |payload: u32| {
            seen.push(payload);
            if seen.len() > 1 {
                AckDirective::NackDiscard
            } else {
                AckDirective::Ack
            }
        };

        // When
        let first = Handler::handle(&mut handler, 1);
        let second = Handler::handle(&mut handler, 2);

        // Then
        assert_eq!(AckDirective::Ack, first);
        assert_eq!(AckDirective::NackDiscard, second);
    }
}
