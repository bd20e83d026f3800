//! The capture scheduling loop.

use crate::{Capture, RunError, ScheduleClock, interrupted};
use cosmobot_storage::{DiskSpaceGuard, FreeBytes};
use cosmobot_sync::{RemoteSync, SyncManager, SyncOptions};
use cosmobot_types::{EndReason, Outcome, RunConfig};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// One experiment run: the capture cadence plus everything it talks to.
///
/// The run owns its sync manager, so there is exactly one writer to the
/// background job state. [`Experiment::run`] and [`Experiment::shutdown`]
/// consume the experiment, which makes shutdown happen at most once.
#[derive(Debug)]
pub struct Experiment<C, F, R> {
    pub(crate) config: RunConfig,
    pub(crate) capture: C,
    pub(crate) guard: DiskSpaceGuard<F>,
    pub(crate) sync: SyncManager<R>,
    pub(crate) batches: u64,
    pub(crate) captures: u64,
}

impl<C, F, R> Experiment<C, F, R>
where
    C: Capture,
    F: FreeBytes,
    R: RemoteSync,
{
    /// How often the loop checks whether the next batch is due.
    pub const POLL_QUANTUM: Duration = Duration::from_millis(100);

    /// Creates an experiment. The experiment directory must already exist.
    #[must_use]
    pub const fn new(
        config: RunConfig,
        capture: C,
        guard: DiskSpaceGuard<F>,
        sync: SyncManager<R>,
    ) -> Self {
        Self {
            config,
            capture,
            guard,
            sync,
            batches: 0,
            captures: 0,
        }
    }

    /// Returns the run configuration.
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Returns the sync manager.
    #[must_use]
    pub const fn sync_manager(&self) -> &SyncManager<R> {
        &self.sync
    }

    /// Number of batches started so far.
    #[must_use]
    pub const fn batches(&self) -> u64 {
        self.batches
    }

    /// Number of captures written so far.
    #[must_use]
    pub const fn captures(&self) -> u64 {
        self.captures
    }

    /// Runs until the duration elapses, space runs out, a collaborator
    /// fails, or the operator interrupts, then shuts down.
    ///
    /// A second interrupt during shutdown abandons the final sync.
    pub async fn run(self) -> Outcome {
        self.run_until(interrupted).await
    }

    /// Like [`Experiment::run`], but takes interrupts from `interrupts`
    /// instead of signals. It is called once for the run and once more for
    /// the final sync; when the first future resolves the run stops with
    /// [`EndReason::Cancelled`].
    ///
    /// An interrupt drops the in-flight batch at its next await point; the
    /// capture collaborator cleans up after itself.
    pub async fn run_until<G, I>(mut self, mut interrupts: G) -> Outcome
    where
        G: FnMut() -> I,
        I: Future<Output = ()>,
    {
        let reason = tokio::select! {
            biased;
            () = interrupts() => EndReason::Cancelled,
            result = self.perform() => match result {
                Ok(reason) => reason,
                Err(e) => {
                    error!(error = %e, "Experiment loop failed");
                    EndReason::Failed(e.to_string())
                }
            },
        };

        self.shutdown_until(reason, interrupts()).await
    }

    /// The scheduling loop. Returns how it ended normally.
    async fn perform(&mut self) -> Result<EndReason, RunError> {
        info!(
            name = %self.config.name,
            directory = %self.config.experiment_directory.display(),
            interval_secs = self.config.interval.as_secs_f64(),
            duration_secs = self.config.duration.map(|d| d.as_secs_f64()),
            variants = self.config.variants.len(),
            "Starting experiment"
        );
        if self.config.duration.is_none() {
            let remaining = self.guard.estimated_remaining_captures()?;
            info!(remaining, "No duration given, running until out of space or interrupted");
        }

        let start = Instant::now();
        let deadline = self.config.duration.map(|duration| start + duration);
        let mut clock = ScheduleClock::starting_at(start, self.config.interval);

        while deadline.is_none_or(|deadline| Instant::now() < deadline) {
            if !clock.is_due(Instant::now()) {
                tokio::time::sleep(Self::POLL_QUANTUM).await;
                continue;
            }

            let late = Instant::now().saturating_duration_since(clock.next());
            if late >= clock.interval() {
                warn!(late_secs = late.as_secs_f64(), "Capture batch is running behind schedule");
            }
            clock.advance();

            if let Some(reason) = self.capture_batch().await? {
                return Ok(reason);
            }
        }

        Ok(EndReason::Completed)
    }

    /// Captures every variant once, in order. Returns a reason if the run
    /// has to stop.
    async fn capture_batch(&mut self) -> Result<Option<EndReason>, RunError> {
        self.batches += 1;
        debug!(batch = self.batches, "Starting capture batch");

        for variant in &self.config.variants {
            if !self.guard.free_space_for_one_capture()? {
                return Ok(Some(EndReason::InsufficientSpace));
            }

            let path = self
                .capture
                .capture(&self.config.experiment_directory, variant)
                .await?;
            self.captures += 1;
            info!(
                batch = self.batches,
                variant = %variant.label(),
                path = %path.display(),
                "Captured image"
            );

            // Best effort: the next capture requests another sync.
            if !self.config.skip_sync
                && let Err(e) = self
                    .sync
                    .enqueue(&self.config.experiment_directory, SyncOptions::ongoing())
                    .await
            {
                warn!(batch = self.batches, error = %e, "Failed to start background sync");
            }
        }

        Ok(None)
    }
}
