use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Represents the outcome a [`Handler`](crate::Handler) requests for a
/// processed delivery. Exactly one directive is produced per successfully
/// decoded delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AckDirective {
    /// Positively acknowledge the message: the broker removes it from the
    /// queue for good.
    Ack,
    /// Negatively acknowledge the message and re-queue it for redelivery.
    NackRequeue,
    /// Negatively acknowledge the message without re-queueing. The broker
    /// routes it to the queue's dead-letter exchange, if one is declared.
    NackDiscard,
}

/// Represents a raw directive code that does not correspond to any
/// [`AckDirective`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unknown acknowledgment directive code: {0}")]
pub struct UnknownAckDirective(pub u8);

impl AckDirective {
    /// Reports the `requeue` flag to pass along a `nack`, or [`None`] if this
    /// directive is a positive acknowledgment.
    pub const fn requeue(&self) -> Option<bool> {
        match self {
            AckDirective::Ack => None,
            AckDirective::NackRequeue => Some(true),
            AckDirective::NackDiscard => Some(false),
        }
    }

    /// Returns the raw code of this directive.
    pub const fn code(&self) -> u8 {
        match self {
            AckDirective::Ack => 0,
            AckDirective::NackRequeue => 1,
            AckDirective::NackDiscard => 2,
        }
    }

    /// Returns the human-readable name of this directive.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AckDirective::Ack => "ack",
            AckDirective::NackRequeue => "nack_requeue",
            AckDirective::NackDiscard => "nack_discard",
        }
    }
}

impl Display for AckDirective {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for AckDirective {
    type Error = UnknownAckDirective;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AckDirective::Ack),
            1 => Ok(AckDirective::NackRequeue),
            2 => Ok(AckDirective::NackDiscard),
            other => Err(UnknownAckDirective(other)),
        }
    }
}

/// Converts a handler's return value into an [`AckDirective`].
///
/// Handlers normally return an [`AckDirective`] directly. Handlers that still
/// speak raw directive codes may return a `u8`; codes outside the known range
/// leave the delivery unacknowledged.
pub trait IntoAckDirective {
    /// Performs the conversion.
    fn into_ack_directive(self) -> Result<AckDirective, UnknownAckDirective>;
}

impl IntoAckDirective for AckDirective {
    fn into_ack_directive(self) -> Result<AckDirective, UnknownAckDirective> {
        Ok(self)
    }
}

impl IntoAckDirective for u8 {
    fn into_ack_directive(self) -> Result<AckDirective, UnknownAckDirective> {
        AckDirective::try_from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn requeue_flag() {
        assert_eq!(None, AckDirective::Ack.requeue());
        assert_eq!(Some(true), AckDirective::NackRequeue.requeue());
        assert_eq!(Some(false), AckDirective::NackDiscard.requeue());
    }

    #[test]
    fn from_known_codes() {
        for directive in [
            AckDirective::Ack,
            AckDirective::NackRequeue,
            AckDirective::NackDiscard,
        ] {
            assert_eq!(Ok(directive), AckDirective::try_from(directive.code()));
        }
    }

    #[test]
    fn from_unknown_code() {
        // When
        let result = 7u8.into_ack_directive();

        // Then
        assert_eq!(Err(UnknownAckDirective(7)), result);
    }
}
