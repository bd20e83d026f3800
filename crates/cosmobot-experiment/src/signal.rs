//! Operator interrupt handling.

use tracing::warn;

/// Resolves when the operator interrupts the run: Ctrl-C, or `SIGTERM` on
/// unix (as sent by a service manager stopping the unit).
///
/// If a handler cannot be installed the failure is logged and that signal
/// is never reported.
pub async fn interrupted() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    () = ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
