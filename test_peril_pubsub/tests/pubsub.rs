mod common;

#[cfg(test)]
mod tests {
    use crate::common::handle::connect;
    use crate::common::names::{mangle, random_token};
    use crate::common::receiver::{assert_quiet, forwarding_handler, receive_one};
    use peril_pubsub::{
        AckDirective, Binding, Broker, BrokerChannel, JsonSubscriber, QueueBinder, QueueType,
        SetupError, StringDecoder, Subscriber, publish_json, subscribe_json,
    };
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};
    use std::any::type_name_of_val;

    const DIRECT: &str = "amq.direct";
    const FANOUT: &str = "amq.fanout";

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct PlayingState {
        #[serde(rename = "IsPaused")]
        is_paused: bool,
    }

    #[tokio::test]
    #[ignore]
    async fn pause_end_to_end() {
        // Given
        let broker = connect().await;
        let queue = mangle(type_name_of_val(&pause_end_to_end));
        let (handler, mut received) = forwarding_handler::<PlayingState>(AckDirective::Ack);
        let subscription =
            subscribe_json(&broker, DIRECT, &queue, &queue, QueueType::Transient, handler)
                .await
                .unwrap();
        let channel = broker.open_channel().await.unwrap();

        // When
        publish_json(&channel, DIRECT, &queue, &PlayingState { is_paused: true })
            .await
            .unwrap();

        // Then
        assert_eq!(
            Some(PlayingState { is_paused: true }),
            receive_one(&mut received).await,
        );
        assert_quiet(&mut received).await;
        assert_eq!(queue, subscription.queue());

        // Finally
        broker.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn gibberish_is_dead_lettered() {
        // Given
        let broker = connect().await;
        let queue = mangle(type_name_of_val(&gibberish_is_dead_lettered));
        let dead_letters = format!("{}.dlq", queue);
        let (handler, mut received) = forwarding_handler::<PlayingState>(AckDirective::Ack);
        let (dlq_handler, mut dead) = forwarding_handler::<String>(AckDirective::Ack);
        Subscriber::new(
            Binding::new(FANOUT, &dead_letters, "", QueueType::Transient),
            StringDecoder,
        )
        .subscribe(&broker, dlq_handler)
        .await
        .unwrap();
        JsonSubscriber::<PlayingState>::new_json(Binding::new(
            DIRECT,
            &queue,
            &queue,
            QueueType::Transient,
        ))
        .with_binder(QueueBinder::new(FANOUT))
        .subscribe(&broker, handler)
        .await
        .unwrap();
        let channel = broker.open_channel().await.unwrap();
        let token = random_token();

        // When
        channel
            .publish(DIRECT, &queue, token.as_bytes(), "text/plain")
            .await
            .unwrap();

        // Then
        assert_eq!(Some(token), receive_one(&mut dead).await);
        assert_quiet(&mut received).await;

        // Finally
        broker.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn requeued_message_comes_back() {
        // Given
        let broker = connect().await;
        let queue = mangle(type_name_of_val(&requeued_message_comes_back));
        let (mut forward, mut received) = forwarding_handler::<String>(AckDirective::Ack);
        let mut calls = 0;
        let handler = move |value: String| {
            calls += 1;
            forward(value);

            if calls == 1 {
                AckDirective::NackRequeue
            } else {
                AckDirective::Ack
            }
        };
        Subscriber::new(
            Binding::new(DIRECT, &queue, &queue, QueueType::Transient),
            StringDecoder,
        )
        .subscribe(&broker, handler)
        .await
        .unwrap();
        let channel = broker.open_channel().await.unwrap();
        let token = random_token();

        // When
        channel
            .publish(DIRECT, &queue, token.as_bytes(), "text/plain")
            .await
            .unwrap();

        // Then
        assert_eq!(Some(token.clone()), receive_one(&mut received).await);
        assert_eq!(Some(token), receive_one(&mut received).await);
        assert_quiet(&mut received).await;

        // Finally
        broker.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn rebinding() {
        // Given
        let broker = connect().await;
        let queue = mangle(type_name_of_val(&rebinding));
        let binder = QueueBinder::default();
        let binding = Binding::new(DIRECT, &queue, &queue, QueueType::Transient);
        let conflicting = Binding::new(DIRECT, &queue, &queue, QueueType::Durable);

        // When
        let first = binder.bind(&broker, &binding).await;
        let second = binder.bind(&broker, &binding).await;
        let third = binder.bind(&broker, &conflicting).await;

        // Then
        assert!(first.is_ok());
        assert!(second.is_ok());
        assert!(matches!(third, Err(SetupError::Declaration(_))));

        // Finally
        broker.close().await.unwrap();
    }
}
