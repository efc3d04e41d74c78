use peril_pubsub::Lifecycle;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

// Global singleton lifecycle shared by every subscription of the process
static LIFECYCLE: OnceLock<Lifecycle> = OnceLock::new();

/// Facade representing the global (singleton) application context.
///
/// The context starts “alive” and can be [terminated](AppContext::terminate)
/// once, either manually or on the first intercepted OS shutdown signal (see
/// [`auto_terminate`](AppContext::auto_terminate)). Subscriptions started with
/// the [`lifecycle`](AppContext::lifecycle) of this context stop consuming when
/// it is terminated.
pub struct AppContext;

impl AppContext {
    /// Returns a clone of the global [`Lifecycle`], suitable for passing to
    /// [`Subscriber::with_lifecycle`](peril_pubsub::Subscriber::with_lifecycle).
    pub fn lifecycle() -> Lifecycle {
        Self::global().clone()
    }

    fn global() -> &'static Lifecycle {
        LIFECYCLE.get_or_init(Lifecycle::new)
    }

    /// Blocks until the global application context is terminated. Completes
    /// immediately if it already is.
    pub async fn terminated() {
        Self::global().terminated().await;
    }

    /// Terminates the global application context. Repeated termination has no
    /// additional effect.
    pub fn terminate() {
        Self::global().terminate();
    }

    /// Reports whether the global application context has been terminated as of
    /// this moment.
    pub fn is_terminated() -> bool {
        Self::global().is_terminated()
    }

    /// Schedules listening for the OS shutdown signals. The first intercepted
    /// signal [terminates](AppContext::terminate) this context; a repeated
    /// signal exits the process immediately with a non-zero status code.
    ///
    /// Repeated calls to this method produce no additional effect.
    pub async fn auto_terminate() {
        static CALLED: AtomicBool = AtomicBool::new(false);

        if CALLED.swap(true, Ordering::Relaxed) {
            return;
        }

        tokio::spawn(Self::listen_for_shutdown_signals());

        // Let the listener start before returning
        tokio::task::yield_now().await;
    }

    async fn listen_for_shutdown_signals() {
        if !Self::wait_for_shutdown_signal().await {
            return;
        }

        info!("Shutdown signal intercepted");
        Self::terminate();

        if !Self::wait_for_shutdown_signal().await {
            return;
        }

        warn!("Repeated shutdown signal intercepted; exiting");
        std::process::exit(1);
    }

    /// Waits for the next `SIGINT` or `SIGTERM`. Returns `false` if the signal
    /// handlers could not be installed.
    #[cfg(unix)]
    async fn wait_for_shutdown_signal() -> bool {
        use tokio::signal::unix::{SignalKind, signal};

        let (mut sigint, mut sigterm) =
            match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
                (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
                (Err(error), _) | (_, Err(error)) => {
                    error!(
                        alert = true,
                        ?error,
                        error_message = %error,
                        "Failed to listen for shutdown signals",
                    );
                    return false;
                }
            };

        tokio::select! {
            biased;
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }

        true
    }

    /// Waits for the next `ctrl_c` action. Returns `false` if the handler could
    /// not be installed.
    #[cfg(not(unix))]
    async fn wait_for_shutdown_signal() -> bool {
        match tokio::signal::ctrl_c().await {
            Ok(()) => true,
            Err(error) => {
                error!(
                    alert = true,
                    ?error,
                    error_message = %error,
                    "Failed to listen for shutdown signals",
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn terminate_reaches_handed_out_lifecycles() {
        // Given
        let lifecycle = AppContext::lifecycle();
        let waiter = tokio::spawn(async move { lifecycle.terminated().await });

        // When
        AppContext::terminate();

        // Then
        waiter.await.unwrap();
        assert!(AppContext::is_terminated());
        AppContext::terminated().await;
    }
}
