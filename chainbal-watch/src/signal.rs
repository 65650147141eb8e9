//! OS shutdown signal handling.
//!
//! On Unix, [`ShutdownSignal`] listens for SIGTERM and SIGINT. Elsewhere it
//! listens for Ctrl+C. Either one cancels the token handed out by
//! [`ShutdownSignal::token`].

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Cancels a token when the process is asked to stop.
#[allow(missing_debug_implementations)] // TaskTracker doesn't impl Debug
pub struct ShutdownSignal {
    listener: TaskTracker,
    token: CancellationToken,
}

impl ShutdownSignal {
    /// Installs the signal handlers. Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an [`std::io::Error`] if signal registration fails.
    #[allow(clippy::unnecessary_wraps)] // Result needed on Unix for signal registration
    pub fn install() -> Result<Self, std::io::Error> {
        let token = CancellationToken::new();
        let listener = TaskTracker::new();

        #[cfg(unix)]
        {
            let mut sigterm = signal(SignalKind::terminate())?;
            let mut sigint = signal(SignalKind::interrupt())?;
            let trigger = token.clone();
            listener.spawn(async move {
                let name = tokio::select! {
                    _ = sigterm.recv() => "SIGTERM",
                    _ = sigint.recv() => "SIGINT",
                    () = trigger.cancelled() => return,
                };
                tracing::info!(signal = name, "shutdown requested");
                trigger.cancel();
            });
        }

        #[cfg(not(unix))]
        {
            let trigger = token.clone();
            listener.spawn(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!(signal = "ctrl-c", "shutdown requested");
                        trigger.cancel();
                    }
                    () = trigger.cancelled() => {}
                }
            });
        }

        listener.close();
        Ok(Self { listener, token })
    }

    /// Token cancelled on shutdown.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Waits for a shutdown signal, or for the token to be cancelled by other
    /// means, and for the listener task to exit.
    pub async fn recv(&self) {
        self.token.cancelled().await;
        self.listener.wait().await;
    }
}
