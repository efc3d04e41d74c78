use crate::{DsnChunks, Handle, QueueBinder, DEFAULT_DEAD_LETTER_EXCHANGE};
use secure_string::SecureString;
use serde::Deserialize;

/// Represents the application-level configuration section that covers
/// everything related to RabbitMQ messaging:
///
/// - server URL and credentials ([`Handle`]),
/// - the dead-letter exchange attached to every declared queue.
///
/// The handle fields sit directly in this section:
///
/// ```yaml
/// host: localhost
/// port: 5672
/// user: guest
/// password: guest
/// vhost: /
/// dead_letter_exchange: peril_dlx
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "PubSubInput")]
pub struct PubSubConfig {
    handle: Handle,
    dead_letter_exchange: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct PubSubInput {
    name: Option<String>,
    #[serde(alias = "hostname")]
    host: Option<String>,
    port: Option<u16>,
    #[serde(alias = "username")]
    user: Option<String>,
    password: Option<SecureString>,
    vhost: Option<String>,
    #[serde(alias = "dlx")]
    dead_letter_exchange: Option<String>,
}

impl PubSubConfig {
    /// Creates a new configuration from the given parts.
    pub fn new(handle: Handle, dead_letter_exchange: impl Into<String>) -> Self {
        Self {
            handle,
            dead_letter_exchange: dead_letter_exchange.into(),
        }
    }

    /// Returns the connection [`Handle`].
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Returns the dead-letter exchange name.
    pub fn dead_letter_exchange(&self) -> &str {
        &self.dead_letter_exchange
    }

    /// Builds a [`QueueBinder`] that attaches the configured dead-letter
    /// exchange.
    pub fn binder(&self) -> QueueBinder {
        QueueBinder::new(&self.dead_letter_exchange)
    }
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self::new(Handle::default(), DEFAULT_DEAD_LETTER_EXCHANGE)
    }
}

impl From<PubSubInput> for PubSubConfig {
    fn from(input: PubSubInput) -> Self {
        let defaults: DsnChunks<&str, &str, &str, &str> = DsnChunks::default();

        let handle = Handle::new(
            input.name.as_deref().unwrap_or(Handle::default_name()),
            DsnChunks {
                host: input.host.as_deref().unwrap_or(defaults.host),
                port: input.port.unwrap_or(defaults.port),
                user: input.user.as_deref().unwrap_or(defaults.user),
                password: input
                    .password
                    .unwrap_or_else(|| SecureString::from(defaults.password)),
                vhost: input.vhost.as_deref().unwrap_or(defaults.vhost),
            },
        );

        let dead_letter_exchange = input
            .dead_letter_exchange
            .unwrap_or_else(|| DEFAULT_DEAD_LETTER_EXCHANGE.to_string());

        Self::new(handle, dead_letter_exchange)
    }
}

impl AsRef<PubSubConfig> for PubSubConfig {
    fn as_ref(&self) -> &PubSubConfig {
        self
    }
}

impl AsRef<Handle> for PubSubConfig {
    fn as_ref(&self) -> &Handle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserialize_from_empty() {
        // Given
        let input = "{}";
        let expected_output = PubSubConfig::default();

        // When
        let actual_output = serde_yml::from_str::<PubSubConfig>(input).unwrap();

        // Then
        assert_eq!(expected_output, actual_output);
        assert_eq!("peril_dlx", actual_output.dead_letter_exchange());
    }

    #[test]
    fn deserialize_from_full() {
        // Given
        let input = r#"
name: game
host: rabbit
port: 5673
user: peril
password: secret
vhost: /game
dlx: game_dlx
"#;
        let expected_output = PubSubConfig::new(
            Handle::new(
                "game",
                DsnChunks {
                    host: "rabbit",
                    port: 5673,
                    user: "peril",
                    password: "secret",
                    vhost: "/game",
                },
            ),
            "game_dlx",
        );

        // When
        let actual_output = serde_yml::from_str::<PubSubConfig>(input).unwrap();

        // Then
        assert_eq!(expected_output, actual_output);
        assert_eq!("peril@rabbit:5673/%2Fgame", actual_output.handle().identifier());
    }

    #[test]
    fn binder_carries_dead_letter_exchange() {
        // Given
        let config = PubSubConfig::new(Handle::default(), "custom_dlx");

        // When
        let binder = config.binder();

        // Then
        assert_eq!("custom_dlx", binder.dead_letter_exchange());
    }
}
