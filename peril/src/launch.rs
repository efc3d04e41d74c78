use crate::{AppConfig, LoadError};
use peril_pubsub::{PublishingError, SetupError, TransportError};
use peril_tracing::{Registry, SubscriberExt, SubscriberInitExt, make_layer};
use thiserror::Error;

/// Represents a failure that stops one of the Peril binaries.
#[derive(Error, Debug)]
pub enum LaunchError {
    /// The configuration could not be assembled.
    #[error(transparent)]
    Config(#[from] LoadError),

    /// The broker could not be reached, or a channel could not be opened.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The queue of a subscription could not be set up.
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// An announcement could not be published.
    #[error(transparent)]
    Publishing(#[from] PublishingError),

    /// Neither the command line nor the configuration names the player.
    #[error("no username given: pass it as the first argument or set APP_USERNAME")]
    MissingUsername,
}

/// Installs the global `tracing` subscriber configured by the tracing section
/// of the given [`AppConfig`]. Does nothing if a global subscriber is already
/// installed.
pub fn init_tracing(config: &AppConfig) {
    let _ = Registry::default()
        .with(make_layer(config.tracing()))
        .try_init();
}
