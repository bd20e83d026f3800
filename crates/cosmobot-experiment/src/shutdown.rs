//! Terminal cleanup for an experiment run.

use crate::{Capture, Experiment, interrupted};
use cosmobot_storage::FreeBytes;
use cosmobot_sync::{EnqueueOutcome, RemoteSync, SyncOptions};
use cosmobot_types::{EndReason, FinalSync, Outcome};
use std::future::Future;
use tracing::{error, info, warn};

impl<C, F, R> Experiment<C, F, R>
where
    C: Capture,
    F: FreeBytes,
    R: RemoteSync,
{
    /// Ends the run: cancels any background sync, runs one final blocking
    /// sync that includes logs, and erases the local directory if configured.
    ///
    /// With sync disabled nothing is cancelled, synced or erased. The
    /// directory is only removed after a successful final sync, and only if
    /// the sync left it empty.
    ///
    /// Ctrl-C or `SIGTERM` during the final sync cancels it.
    pub async fn shutdown(self, reason: EndReason) -> Outcome {
        self.shutdown_until(reason, interrupted()).await
    }

    /// Like [`Experiment::shutdown`], but the final sync is abandoned when
    /// `interrupt` resolves instead of on a signal.
    pub async fn shutdown_until<I>(mut self, reason: EndReason, interrupt: I) -> Outcome
    where
        I: Future<Output = ()>,
    {
        if reason.is_error() {
            error!(batches = self.batches, captures = self.captures, "{reason}");
        } else {
            info!(batches = self.batches, captures = self.captures, "{reason}");
        }

        let mut outcome = Outcome {
            reason,
            final_sync: FinalSync::Skipped,
            cleanup_error: None,
        };
        if self.config.skip_sync {
            return outcome;
        }

        if let Err(e) = self.sync.cancel_and_clear().await {
            warn!(error = %e, "Failed to cancel background sync");
        }

        let directory = &self.config.experiment_directory;
        let options =
            SyncOptions::final_sync(self.config.erase_synced_files, self.config.final_sync_timeout);
        info!(directory = %directory.display(), "Running final sync");
        let result = tokio::select! {
            biased;
            () = interrupt => None,
            result = self.sync.enqueue(directory, options) => Some(result),
        };
        outcome.final_sync = match result {
            None => {
                warn!("Interrupted during final sync, cancelling it");
                if let Err(e) = self.sync.cancel_and_clear().await {
                    warn!(error = %e, "Failed to cancel final sync");
                }
                FinalSync::Failed("interrupted".to_string())
            }
            Some(Ok(EnqueueOutcome::Finished { success: true, .. })) => FinalSync::Succeeded,
            Some(Ok(EnqueueOutcome::Finished { code, .. })) => {
                let message = code.map_or_else(
                    || "sync terminated by signal".to_string(),
                    |code| format!("sync exited with code {code}"),
                );
                error!("Final sync failed: {message}");
                FinalSync::Failed(message)
            }
            Some(Ok(other)) => {
                // Blocking requests always finish once the manager is idle.
                let message = format!("unexpected sync outcome {other:?}");
                error!("Final sync failed: {message}");
                FinalSync::Failed(message)
            }
            Some(Err(e)) => {
                error!(error = %e, "Final sync failed");
                FinalSync::Failed(e.to_string())
            }
        };

        if self.config.erase_synced_files && outcome.final_sync == FinalSync::Succeeded {
            match tokio::fs::remove_dir(directory).await {
                Ok(()) => info!(directory = %directory.display(), "Removed local experiment directory"),
                Err(e) => {
                    error!(
                        directory = %directory.display(),
                        error = %e,
                        "Failed to remove local experiment directory"
                    );
                    outcome.cleanup_error = Some(e.to_string());
                }
            }
        }

        outcome
    }
}
