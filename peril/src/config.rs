use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use peril_pubsub::PubSubConfig;
use peril_tracing::TracingConfig;
use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE: &str = "config/app";
const ENV_PREFIX: &str = "APP";
const ENV_SEPARATOR: &str = "__";

/// The root of the application configuration.
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    name: String,
    username: Option<String>,
    #[serde(alias = "amqp")]
    rabbitmq: PubSubConfig,
    tracing: TracingConfig,
}

/// Represents failure to assemble the [`AppConfig`].
#[derive(Error, Debug)]
#[error("failed to load the application configuration: {source}")]
pub struct LoadError {
    #[from]
    source: config::ConfigError,
}

impl AppConfig {
    /// Loads the configuration from the optional `config/app.{toml,yaml}` file
    /// and from the `APP_`-prefixed environment variables, after applying the
    /// `.env` file of the working directory, if any.
    ///
    /// Nested keys in the environment are separated by a double underscore:
    /// `APP_RABBITMQ__HOST=rabbit`.
    pub fn load() -> Result<Self, LoadError> {
        // Variables already set in the environment take precedence
        let _ = dotenvy::dotenv();

        let builder = ConfigBuilder::<DefaultState>::default()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator(ENV_SEPARATOR),
            );

        Self::assemble(builder)
    }

    /// Builds the given [`ConfigBuilder`] and deserializes the result.
    pub fn assemble(builder: ConfigBuilder<DefaultState>) -> Result<Self, LoadError> {
        let config = builder.build()?.try_deserialize()?;

        Ok(config)
    }
}

impl AppConfig {
    /// Returns the application name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the configured player name, if any.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the RabbitMQ section.
    pub fn rabbitmq(&self) -> &PubSubConfig {
        &self.rabbitmq
    }

    /// Returns the tracing section.
    pub fn tracing(&self) -> &TracingConfig {
        &self.tracing
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "peril".to_string(),
            username: None,
            rabbitmq: PubSubConfig::default(),
            tracing: TracingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use peril_tracing::Verbosity;
    use pretty_assertions::assert_eq;

    #[test]
    fn assemble_from_nothing() {
        // Given
        let builder = ConfigBuilder::<DefaultState>::default();

        // When
        let config = AppConfig::assemble(builder).unwrap();

        // Then
        assert_eq!(AppConfig::default(), config);
        assert_eq!("guest@localhost:5672/%2F", config.rabbitmq().handle().identifier());
    }

    #[test]
    fn assemble_from_yaml() {
        // Given
        let input = r#"
name: peril-test
username: alice
rabbitmq:
  host: rabbit
  port: 5673
  vhost: /game
  dlx: game_dlx
tracing:
  level: debug
"#;
        let builder = ConfigBuilder::<DefaultState>::default()
            .add_source(File::from_str(input, FileFormat::Yaml));

        // When
        let config = AppConfig::assemble(builder).unwrap();

        // Then
        assert_eq!("peril-test", config.name());
        assert_eq!(Some("alice"), config.username());
        assert_eq!("guest@rabbit:5673/%2Fgame", config.rabbitmq().handle().identifier());
        assert_eq!("game_dlx", config.rabbitmq().dead_letter_exchange());
        assert_eq!(Verbosity::Debug, config.tracing().verbosity());
    }

    #[test]
    fn overrides_win_over_files() {
        // Given
        let builder = ConfigBuilder::<DefaultState>::default()
            .add_source(File::from_str("username: alice", FileFormat::Yaml))
            .set_override("username", "bob")
            .unwrap();

        // When
        let config = AppConfig::assemble(builder).unwrap();

        // Then
        assert_eq!(Some("bob"), config.username());
    }

    #[test]
    fn malformed_section() {
        // Given
        let builder = ConfigBuilder::<DefaultState>::default()
            .add_source(File::from_str("rabbitmq:\n  port: not-a-port", FileFormat::Yaml));

        // When
        let result = AppConfig::assemble(builder);

        // Then
        assert!(result.is_err());
    }
}
