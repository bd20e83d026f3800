//! Error types for capture and the experiment loop.

use cosmobot_storage::StorageError;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors raised by a capture collaborator.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The capture command could not be started.
    #[error("Failed to run capture command '{program}': {source}")]
    Spawn {
        /// The program that could not be run.
        program: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The capture command exited unsuccessfully.
    #[error("Capture command '{program}' failed with {status}")]
    Failed {
        /// The program that failed.
        program: PathBuf,
        /// Its exit status.
        status: ExitStatus,
    },

    /// Copying a sample file into place failed.
    #[error("Failed to copy '{from}' to '{to}': {source}")]
    Copy {
        /// The sample file.
        from: PathBuf,
        /// The capture destination.
        to: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Unexpected failures that end an experiment run.
#[derive(Error, Debug)]
pub enum RunError {
    /// A capture failed.
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Free space could not be determined.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
