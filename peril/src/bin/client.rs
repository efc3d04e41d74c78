use peril::routing::{EXCHANGE_PERIL_DIRECT, PAUSE_KEY, PlayingState};
use peril::{AppConfig, AppContext, LaunchError, PauseWatch, init_tracing};
use peril_pubsub::{Binding, Connector, JsonSubscriber};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(?error, error_message = %error, "Peril client failed");
            eprintln!("peril-client: {}", error);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), LaunchError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    AppContext::auto_terminate().await;

    let username = std::env::args()
        .nth(1)
        .or_else(|| config.username().map(str::to_string))
        .ok_or(LaunchError::MissingUsername)?;

    info!(name = config.name(), username = username.as_str(), "Starting Peril client");

    let broker = Connector::connect(config.rabbitmq()).await?;

    let (watch, _state) = PauseWatch::new(&username);
    let subscription = JsonSubscriber::<PlayingState>::new_json(Binding::exclusive(
        EXCHANGE_PERIL_DIRECT,
        PAUSE_KEY,
        &username,
    ))
    .with_binder(config.rabbitmq().binder())
    .with_lifecycle(AppContext::lifecycle())
    .subscribe(&broker, watch)
    .await?;

    info!(queue = subscription.queue(), "Listening for pause announcements");
    subscription.closed().await;

    if !AppContext::is_terminated() {
        warn!("Pause announcements stopped arriving; the RabbitMQ connection was lost");
    }

    if let Err(error) = broker.close().await {
        warn!(?error, error_message = %error, "Failed to close the RabbitMQ connection");
    }

    info!("Peril client stopped");

    Ok(())
}
