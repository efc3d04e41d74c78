use serde::{Deserialize, Serialize};

/// The direct exchange carrying server-wide announcements.
pub const EXCHANGE_PERIL_DIRECT: &str = "peril_direct";

/// The topic exchange carrying per-player game traffic.
pub const EXCHANGE_PERIL_TOPIC: &str = "peril_topic";

/// The exchange that discarded messages are dead-lettered to.
pub const EXCHANGE_PERIL_DLX: &str = "peril_dlx";

/// Routing key of pause announcements on [`EXCHANGE_PERIL_DIRECT`].
pub const PAUSE_KEY: &str = "pause";

/// Announces whether the game is currently paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayingState {
    /// Whether the game is paused.
    #[serde(rename = "IsPaused")]
    pub is_paused: bool,
}

/// Composes the name of the per-player queue that receives pause
/// announcements: `pause.<username>`.
pub fn pause_queue(username: &str) -> String {
    format!("{}.{}", PAUSE_KEY, username)
}
