//! Error types for sync job management.

use crate::JobId;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while running sync jobs.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The directory has no final path component to name the remote prefix.
    #[error("Cannot derive a remote name from directory '{path}'")]
    InvalidDirectory {
        /// The directory that was passed in.
        path: PathBuf,
    },

    /// Failed to open the sync log file.
    #[error("Failed to open sync log '{path}': {source}")]
    OpenLog {
        /// The log file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to spawn the sync process.
    #[error("Failed to spawn sync process '{program}': {source}")]
    Spawn {
        /// The program that could not be spawned.
        program: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The spawned process reported no process id.
    #[error("Sync process '{program}' exited before its process id could be read")]
    MissingPid {
        /// The program that was spawned.
        program: PathBuf,
    },

    /// Failed to wait for the sync process.
    #[error("Failed to wait for sync job {job_id}: {source}")]
    Wait {
        /// The job being waited on.
        job_id: JobId,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A blocking sync did not finish in time and was cancelled.
    #[error("Sync job {job_id} did not finish within {limit:?} and was cancelled")]
    TimedOut {
        /// The job that timed out.
        job_id: JobId,
        /// The wait limit that elapsed.
        limit: Duration,
    },

    /// Failed to terminate the sync process group.
    #[error("Failed to terminate sync job {job_id}: {source}")]
    Terminate {
        /// The job being terminated.
        job_id: JobId,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
