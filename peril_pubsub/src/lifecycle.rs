use tokio_util::sync::CancellationToken;
use tracing::info;

/// A cheaply clone-able token that tells long-running tasks (such as the
/// consumption loops started by a [`Subscriber`](crate::Subscriber)) whether
/// the application is still alive.
///
/// A lifecycle starts “alive” and can be [terminated](Lifecycle::terminate)
/// once; repeated termination has no additional effect. All clones share the
/// same state.
///
/// A lifecycle that is never terminated leaves subscriptions running until
/// their delivery streams are closed by the broker.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    token: CancellationToken,
}

impl Lifecycle {
    /// Creates a new, alive lifecycle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminates this lifecycle, waking up every task that
    /// [waits](Lifecycle::terminated) on it.
    pub fn terminate(&self) {
        if !self.token.is_cancelled() {
            info!("Terminating the messaging lifecycle");
        }

        self.token.cancel();
    }

    /// Reports whether this lifecycle has been terminated.
    pub fn is_terminated(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once this lifecycle is terminated. Completes immediately if it
    /// already is.
    pub async fn terminated(&self) {
        self.token.cancelled().await;
    }
}
