use peril::routing::{EXCHANGE_PERIL_DIRECT, PAUSE_KEY, PlayingState};
use peril::{AppConfig, AppContext, LaunchError, init_tracing};
use peril_pubsub::{Broker, Connector, publish_json};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(?error, error_message = %error, "Peril server failed");
            eprintln!("peril-server: {}", error);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), LaunchError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    AppContext::auto_terminate().await;

    info!(name = config.name(), "Starting Peril server");

    let broker = Connector::connect(config.rabbitmq()).await?;
    let channel = broker.open_channel().await?;

    publish_json(
        &channel,
        EXCHANGE_PERIL_DIRECT,
        PAUSE_KEY,
        &PlayingState { is_paused: true },
    )
    .await?;

    info!("Announced the game pause; waiting for a shutdown signal");
    AppContext::terminated().await;

    if let Err(error) = broker.close().await {
        warn!(?error, error_message = %error, "Failed to close the RabbitMQ connection");
    }

    info!("Peril server stopped");

    Ok(())
}
