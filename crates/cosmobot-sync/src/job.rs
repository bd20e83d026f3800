//! Sync job definitions and types.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Child;

/// Identifier for a sync job, unique within one [`crate::SyncManager`].
pub type JobId = u64;

/// Options for one sync request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOptions {
    /// Wait for the job to finish before returning.
    pub block_until_done: bool,
    /// Upload log files too. Logs are still being written during a run.
    pub include_logs: bool,
    /// Remove local files once they are uploaded.
    pub erase_after_upload: bool,
    /// Cancel a blocking job that runs longer than this.
    pub wait_limit: Option<Duration>,
}

impl SyncOptions {
    /// Best-effort sync requested after each capture: non-blocking, logs
    /// excluded, nothing erased.
    #[must_use]
    pub const fn ongoing() -> Self {
        Self {
            block_until_done: false,
            include_logs: false,
            erase_after_upload: false,
            wait_limit: None,
        }
    }

    /// The blocking, log-inclusive sync run once at shutdown.
    #[must_use]
    pub const fn final_sync(erase_after_upload: bool, wait_limit: Option<Duration>) -> Self {
        Self {
            block_until_done: true,
            include_logs: true,
            erase_after_upload,
            wait_limit,
        }
    }
}

/// What an enqueue request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// A new job was started in the background.
    Spawned {
        /// The new job.
        job_id: JobId,
        /// Process id, which is also the job's process group id.
        pid: u32,
    },
    /// A job was already running; the request was coalesced into it.
    AlreadyRunning {
        /// The running job.
        job_id: JobId,
        /// Its process id.
        pid: u32,
    },
    /// A blocking job ran to completion.
    Finished {
        /// The finished job.
        job_id: JobId,
        /// Whether the sync tool exited with status zero.
        success: bool,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
    },
}

/// The live background sync job.
#[derive(Debug)]
pub struct SyncJob {
    pub(crate) id: JobId,
    pub(crate) pid: u32,
    pub(crate) directory: PathBuf,
    pub(crate) options: SyncOptions,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) child: Child,
}

impl SyncJob {
    /// Returns the job id.
    #[must_use]
    pub const fn id(&self) -> JobId {
        self.id
    }

    /// Returns the process id, which is also the process group id.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Returns the directory being synced.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the options the job was started with.
    #[must_use]
    pub const fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Returns when the job was started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Seconds since the job was started.
    #[must_use]
    pub fn elapsed_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
