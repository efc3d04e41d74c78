use crate::{Handle, LapinBroker, TransportError};
use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use lapin::{Connection, ConnectionProperties};
use std::time::Duration;
use tracing::{info, warn};

/// Establishes a connection to the RabbitMQ cluster identified by a
/// [`Handle`], retrying with an exponential backoff until the connection
/// succeeds or the maximum elapsed time runs out.
///
/// The connector does not maintain the connection afterward: a lost
/// connection ends every delivery stream consumed on it, and it is up to the
/// application to connect again.
pub struct Connector {
    handle: Handle,
    initial_interval: Duration,
    max_interval: Duration,
    max_elapsed_time: Option<Duration>,
}

impl Connector {
    /// Creates a new connector for the given [`Handle`] with the default
    /// retry schedule.
    pub fn new(handle: impl AsRef<Handle>) -> Self {
        Self {
            handle: handle.as_ref().clone(),
            initial_interval: Self::default_initial_interval(),
            max_interval: Self::default_max_interval(),
            max_elapsed_time: Self::default_max_elapsed_time(),
        }
    }

    /// Re-creates this connector with the given maximum elapsed time. [`None`]
    /// means retrying forever.
    pub fn with_max_elapsed_time(self, max_elapsed_time: Option<Duration>) -> Self {
        Self {
            max_elapsed_time,
            ..self
        }
    }

    /// Re-creates this connector with the given initial and maximum intervals
    /// between attempts.
    pub fn with_intervals(self, initial_interval: Duration, max_interval: Duration) -> Self {
        Self {
            initial_interval,
            max_interval,
            ..self
        }
    }

    /// A shorthand for creating a [`Connector`] with the default retry
    /// schedule and calling [`establish`](Connector::establish) on it.
    pub async fn connect(handle: impl AsRef<Handle>) -> Result<LapinBroker, TransportError> {
        Self::new(handle).establish().await
    }
}

impl Connector {
    fn default_initial_interval() -> Duration {
        Duration::from_millis(500)
    }

    fn default_max_interval() -> Duration {
        Duration::from_secs(10)
    }

    fn default_max_elapsed_time() -> Option<Duration> {
        Some(Duration::from_secs(30))
    }
}

impl Connector {
    /// Repeatedly attempts to connect, sleeping for the next backoff interval
    /// between attempts. Returns the error of the last attempt once the
    /// backoff gives up.
    pub async fn establish(self) -> Result<LapinBroker, TransportError> {
        let mut backoff = self.backoff();

        loop {
            let error = match self.try_connect().await {
                Ok(connection) => {
                    info!(
                        name = self.handle.name(),
                        identifier = self.handle.identifier(),
                        "Connected to RabbitMQ",
                    );

                    return Ok(LapinBroker::new(connection));
                }
                Err(error) => error,
            };

            // Log the connection error
            warn!(
                name = self.handle.name(),
                identifier = self.handle.identifier(),
                ?error,
                error_message = %error,
                "Failed to establish a RabbitMQ connection",
            );

            // Wait a bit, or give up
            match backoff.next_backoff() {
                Some(duration) => tokio::time::sleep(duration).await,
                None => return Err(TransportError::from(error)),
            }
        }
    }

    /// Makes a single connection attempt on the current Tokio runtime.
    async fn try_connect(&self) -> Result<Connection, lapin::Error> {
        // Set up the connection properties to use the current Tokio context
        let connection_properties = ConnectionProperties::default()
            .with_executor(tokio_executor_trait::Tokio::current())
            .with_reactor(tokio_reactor_trait::Tokio);

        Connection::connect(self.handle.dsn().unsecure(), connection_properties).await
    }

    /// Builds the backoff schedule of this connector.
    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_max_elapsed_time(self.max_elapsed_time)
            .build()
    }
}
