//! Single-flight sync job manager.
//!
//! The manager owns the one piece of shared mutable state in an experiment:
//! the current background sync job, if any. All operations take `&mut self`,
//! so a manager has exactly one writer at a time.

use crate::process;
use crate::{EnqueueOutcome, JobId, RemoteSync, Result, SyncError, SyncJob, SyncOptions};
use chrono::Utc;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Owns at most one live background sync job.
///
/// State machine: `Idle --enqueue--> Running --exit--> Idle`,
/// `Running --enqueue--> Running` (coalesced), and
/// `Running --cancel_and_clear--> Idle`.
#[derive(Debug)]
pub struct SyncManager<R> {
    remote: R,
    log_path: Option<PathBuf>,
    termination_grace: Duration,
    job: Option<SyncJob>,
    last_job_id: JobId,
}

impl<R: RemoteSync> SyncManager<R> {
    /// Time a cancelled job gets to exit after `SIGTERM` before `SIGKILL`.
    pub const DEFAULT_TERMINATION_GRACE: Duration = Duration::from_millis(500);

    /// Creates an idle manager. Job output is discarded.
    #[must_use]
    pub const fn new(remote: R) -> Self {
        Self {
            remote,
            log_path: None,
            termination_grace: Self::DEFAULT_TERMINATION_GRACE,
            job: None,
            last_job_id: 0,
        }
    }

    /// Appends job stdout and stderr to `path`.
    ///
    /// Keep this file outside the synced directory: an erasing sync would
    /// otherwise move the file it is writing to.
    #[must_use]
    pub fn with_log_file(mut self, path: PathBuf) -> Self {
        self.log_path = Some(path);
        self
    }

    /// Sets the grace period between `SIGTERM` and `SIGKILL` on cancel.
    #[must_use]
    pub const fn with_termination_grace(mut self, grace: Duration) -> Self {
        self.termination_grace = grace;
        self
    }

    /// Returns the command builder.
    #[must_use]
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Returns the sync log path, if job output is kept.
    #[must_use]
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Returns the current job handle without checking liveness.
    #[must_use]
    pub const fn current(&self) -> Option<&SyncJob> {
        self.job.as_ref()
    }

    /// Returns true if a job exists and its process has not exited.
    ///
    /// A job that exited on its own is reaped here: its status is logged and
    /// the handle cleared.
    pub fn is_running(&mut self) -> bool {
        let Some(job) = self.job.as_mut() else {
            return false;
        };

        let status = match job.child.try_wait() {
            Ok(None) => return true,
            Ok(Some(status)) => status,
            Err(e) => {
                // Liveness unknown; keep the handle so cancel can still reach it.
                warn!(job_id = job.id, error = %e, "Failed to poll sync job");
                return true;
            }
        };

        log_exit(job, status);
        self.job = None;
        false
    }

    /// Requests a sync of `directory`.
    ///
    /// If a job is already running this does nothing: the running job, or
    /// the next one started after it, picks up newer files. Otherwise a new
    /// job is spawned in its own process group. With
    /// [`SyncOptions::block_until_done`] this waits for the job, bounded by
    /// [`SyncOptions::wait_limit`] if set.
    ///
    /// A job that exits non-zero is not an error; it is reported through
    /// [`EnqueueOutcome::Finished`] for blocking requests and logged
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the job cannot be spawned or waited on, or if a
    /// blocking job exceeds its wait limit (it is cancelled first).
    pub async fn enqueue(
        &mut self,
        directory: &Path,
        options: SyncOptions,
    ) -> Result<EnqueueOutcome> {
        if self.is_running()
            && let Some(job) = &self.job
        {
            debug!(job_id = job.id, pid = job.pid, "Sync already running, request coalesced");
            return Ok(EnqueueOutcome::AlreadyRunning {
                job_id: job.id,
                pid: job.pid,
            });
        }

        let job = self.spawn(directory, options)?;
        let job = self.job.insert(job);
        let (job_id, pid) = (job.id, job.pid);

        if !options.block_until_done {
            return Ok(EnqueueOutcome::Spawned { job_id, pid });
        }

        info!(job_id, pid, "Waiting for sync job to finish");
        let status = match options.wait_limit {
            Some(limit) => match tokio::time::timeout(limit, job.child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    warn!(job_id, ?limit, "Sync job exceeded its wait limit, cancelling");
                    self.cancel_and_clear().await?;
                    return Err(SyncError::TimedOut { job_id, limit });
                }
            },
            None => job.child.wait().await,
        };

        let status = status.map_err(|source| SyncError::Wait { job_id, source })?;
        if let Some(job) = self.job.take() {
            log_exit(&job, status);
        }

        Ok(EnqueueOutcome::Finished {
            job_id,
            success: status.success(),
            code: status.code(),
        })
    }

    /// Cancels the current job and every process it spawned, then clears
    /// the handle. Does nothing when idle.
    ///
    /// # Errors
    ///
    /// Returns an error if the process group cannot be signalled or the
    /// leader cannot be reaped. The handle is cleared either way.
    pub async fn cancel_and_clear(&mut self) -> Result<()> {
        let Some(mut job) = self.job.take() else {
            return Ok(());
        };

        info!(
            job_id = job.id,
            pid = job.pid,
            elapsed_secs = job.elapsed_secs(),
            "Cancelling sync job"
        );
        process::terminate_group(&mut job.child, job.pid, self.termination_grace)
            .await
            .map_err(|source| SyncError::Terminate {
                job_id: job.id,
                source,
            })
    }

    /// Spawns a new job.
    fn spawn(&mut self, directory: &Path, options: SyncOptions) -> Result<SyncJob> {
        let mut command = self.remote.command(directory, &options)?;
        let program = PathBuf::from(command.as_std().get_program());

        let (stdout, stderr) = self.output_streams()?;
        command.stdin(Stdio::null()).stdout(stdout).stderr(stderr);
        process::isolate(&mut command);

        let child = command.spawn().map_err(|source| SyncError::Spawn {
            program: program.clone(),
            source,
        })?;
        let pid = child.id().ok_or(SyncError::MissingPid { program })?;

        self.last_job_id += 1;
        let job = SyncJob {
            id: self.last_job_id,
            pid,
            directory: directory.to_path_buf(),
            options,
            started_at: Utc::now(),
            child,
        };

        info!(
            job_id = job.id,
            pid,
            directory = %directory.display(),
            include_logs = options.include_logs,
            erase = options.erase_after_upload,
            blocking = options.block_until_done,
            "Started sync job"
        );
        Ok(job)
    }

    /// Opens stdout and stderr targets for a new job.
    fn output_streams(&self) -> Result<(Stdio, Stdio)> {
        let Some(path) = &self.log_path else {
            return Ok((Stdio::null(), Stdio::null()));
        };

        let open_error = |source| SyncError::OpenLog {
            path: path.clone(),
            source,
        };
        let stdout = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_error)?;
        let stderr = stdout.try_clone().map_err(open_error)?;

        Ok((stdout.into(), stderr.into()))
    }
}

fn log_exit(job: &SyncJob, status: ExitStatus) {
    if status.success() {
        info!(job_id = job.id, elapsed_secs = job.elapsed_secs(), "Sync job finished");
    } else {
        warn!(
            job_id = job.id,
            elapsed_secs = job.elapsed_secs(),
            %status,
            "Sync job failed"
        );
    }
}
