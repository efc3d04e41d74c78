use crate::routing::PlayingState;
use peril_pubsub::{AckDirective, Handler};
use tokio::sync::watch;
use tracing::info;

/// Handles pause announcements on behalf of a single player: logs every change
/// of the announced state, publishes the latest state to a [`watch`] channel,
/// and acknowledges every announcement.
pub struct PauseWatch {
    username: String,
    sender: watch::Sender<Option<PlayingState>>,
}

impl PauseWatch {
    /// Creates a new watch for the given player, along with the receiver that
    /// observes the latest announced state. The receiver starts at [`None`].
    pub fn new(username: impl Into<String>) -> (Self, watch::Receiver<Option<PlayingState>>) {
        let (sender, receiver) = watch::channel(None);
        let watch = Self {
            username: username.into(),
            sender,
        };

        (watch, receiver)
    }
}

impl Handler<PlayingState> for PauseWatch {
    type Outcome = AckDirective;

    fn handle(&mut self, state: PlayingState) -> AckDirective {
        let previous = self.sender.send_replace(Some(state));

        if previous != Some(state) {
            if state.is_paused {
                info!(username = self.username.as_str(), "Game paused");
            } else {
                info!(username = self.username.as_str(), "Game resumed");
            }
        }

        AckDirective::Ack
    }
}
