use peril::routing::{EXCHANGE_PERIL_DIRECT, PAUSE_KEY, PlayingState, pause_queue};
use peril::PauseWatch;
use peril_pubsub::testing::MemoryBroker;
use peril_pubsub::{Binding, Broker, JsonSubscriber, Lifecycle, QueueType, publish_json};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn pause_reaches_every_player() {
    // Given
    let broker = MemoryBroker::new();
    let (alice, alice_state) = PauseWatch::new("alice");
    let (bob, bob_state) = PauseWatch::new("bob");
    let alice_subscription = JsonSubscriber::<PlayingState>::new_json(Binding::exclusive(
        EXCHANGE_PERIL_DIRECT,
        PAUSE_KEY,
        "alice",
    ))
    .subscribe(&broker, alice)
    .await
    .unwrap();
    let bob_subscription = JsonSubscriber::<PlayingState>::new_json(Binding::exclusive(
        EXCHANGE_PERIL_DIRECT,
        PAUSE_KEY,
        "bob",
    ))
    .subscribe(&broker, bob)
    .await
    .unwrap();

    // When
    let channel = broker.open_channel().await.unwrap();
    publish_json(
        &channel,
        EXCHANGE_PERIL_DIRECT,
        PAUSE_KEY,
        &PlayingState { is_paused: true },
    )
    .await
    .unwrap();
    broker.close();
    alice_subscription.closed().await;
    bob_subscription.closed().await;

    // Then
    assert_eq!(Some(PlayingState { is_paused: true }), *alice_state.borrow());
    assert_eq!(Some(PlayingState { is_paused: true }), *bob_state.borrow());
    assert_eq!(2, broker.acks().len());
    assert!(broker.nacks().is_empty());
    assert_eq!(
        Some(QueueType::Transient.flags()),
        broker.queue_flags(&pause_queue("alice")),
    );
}

#[tokio::test]
async fn malformed_announcement_is_discarded() {
    // Given
    let broker = MemoryBroker::new();
    let (watch, state) = PauseWatch::new("carol");
    let subscription = JsonSubscriber::<PlayingState>::new_json(Binding::exclusive(
        EXCHANGE_PERIL_DIRECT,
        PAUSE_KEY,
        "carol",
    ))
    .subscribe(&broker, watch)
    .await
    .unwrap();

    // When
    broker.inject(&pause_queue("carol"), b"not json at all".to_vec());
    broker.close();
    subscription.closed().await;

    // Then
    assert_eq!(None, *state.borrow());
    assert!(broker.acks().is_empty());
    assert_eq!(vec![(1, false)], broker.nacks());
}

#[tokio::test]
async fn terminated_lifecycle_stops_the_client() {
    // Given
    let broker = MemoryBroker::new();
    let lifecycle = Lifecycle::new();
    let (watch, _state) = PauseWatch::new("dave");
    let subscription = JsonSubscriber::<PlayingState>::new_json(Binding::exclusive(
        EXCHANGE_PERIL_DIRECT,
        PAUSE_KEY,
        "dave",
    ))
    .with_lifecycle(lifecycle.clone())
    .subscribe(&broker, watch)
    .await
    .unwrap();

    // When
    lifecycle.terminate();
    subscription.closed().await;

    // Then
    assert!(broker.acks().is_empty());
    assert!(broker.nacks().is_empty());
}
