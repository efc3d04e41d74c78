use crate::QueueFlags;
use serde::Deserialize;
use std::fmt::{Display, Formatter};

/// Defines the lifetime policy of a declared queue. The policy fully determines
/// the [`QueueFlags`] used in the declaration: there is no way to override any
/// single flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueType {
    /// Survives a broker restart, is never deleted automatically, and may be
    /// shared between connections.
    Durable,
    /// Belongs to exactly one connection: deleted when that connection closes,
    /// and lost on broker restart.
    #[serde(alias = "temporary", alias = "exclusive")]
    Transient,
}

impl QueueType {
    /// Returns the declaration flags implied by this policy.
    pub const fn flags(&self) -> QueueFlags {
        match self {
            QueueType::Durable => QueueFlags {
                durable: true,
                auto_delete: false,
                exclusive: false,
            },
            QueueType::Transient => QueueFlags {
                durable: false,
                auto_delete: true,
                exclusive: true,
            },
        }
    }

    /// Returns the human-readable name of this policy.
    pub const fn as_str(&self) -> &'static str {
        match self {
            QueueType::Durable => "durable",
            QueueType::Transient => "transient",
        }
    }
}

impl Display for QueueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn durable_flags() {
        // Given
        let queue_type = QueueType::Durable;
        let expected_flags = QueueFlags {
            durable: true,
            auto_delete: false,
            exclusive: false,
        };

        // When
        let actual_flags = queue_type.flags();

        // Then
        assert_eq!(expected_flags, actual_flags);
    }

    #[test]
    fn transient_flags() {
        // Given
        let queue_type = QueueType::Transient;
        let expected_flags = QueueFlags {
            durable: false,
            auto_delete: true,
            exclusive: true,
        };

        // When
        let actual_flags = queue_type.flags();

        // Then
        assert_eq!(expected_flags, actual_flags);
    }

    #[test]
    fn display() {
        assert_eq!("durable", QueueType::Durable.to_string());
        assert_eq!("transient", QueueType::Transient.to_string());
    }

    #[test]
    fn deserialize() {
        // Given
        let input = "[durable, transient, exclusive]";
        let expected_output = vec![
            QueueType::Durable,
            QueueType::Transient,
            QueueType::Transient,
        ];

        // When
        let actual_output = serde_yml::from_str::<Vec<QueueType>>(input).unwrap();

        // Then
        assert_eq!(expected_output, actual_output);
    }
}
