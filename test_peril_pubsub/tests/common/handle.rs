use peril_pubsub::{Connector, DsnChunks, Handle, LapinBroker};
use std::time::Duration;

pub fn make_rabbitmq_handle() -> Handle {
    let host = std::env::var("RABBITMQ_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = std::env::var("RABBITMQ_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(5672);
    let user = std::env::var("RABBITMQ_USER").unwrap_or_else(|_| "guest".to_string());
    let password = std::env::var("RABBITMQ_PASSWORD").unwrap_or_else(|_| "guest".to_string());

    Handle::new(
        "test_rabbitmq",
        DsnChunks {
            host,
            port,
            user,
            password: password.as_str(),
            vhost: "/",
        },
    )
}

pub async fn connect() -> LapinBroker {
    Connector::new(make_rabbitmq_handle())
        .with_max_elapsed_time(Some(Duration::from_secs(5)))
        .establish()
        .await
        .expect("a RabbitMQ broker should be reachable")
}
