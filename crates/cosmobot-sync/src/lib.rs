//! Background sync job management for cosmobot capture experiments.
//!
//! This crate provides single-flight management of the process that pushes
//! an experiment directory to remote storage:
//!
//! - [`SyncManager`] - Owns at most one live sync job; enqueue, wait, cancel
//! - [`SyncOptions`] - Blocking, log inclusion and erase-after-upload flags
//! - [`SyncJob`] - The live job and its process group
//! - [`RemoteSync`] - Builds the sync command for a directory
//! - [`AwsS3Sync`] - [`RemoteSync`] using the `aws s3` CLI

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod job;
mod manager;
mod process;
mod remote;

pub use error::{Result, SyncError};
pub use job::{EnqueueOutcome, JobId, SyncJob, SyncOptions};
pub use manager::SyncManager;
pub use remote::{AwsS3Sync, LOG_FILE_PATTERN, RemoteSync};
