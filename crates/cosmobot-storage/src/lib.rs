//! Free disk space checks for cosmobot capture experiments.
//!
//! - [`DiskSpaceGuard`] - Compares free space against a per-capture budget
//! - [`FreeBytes`] - Source of the current free byte count
//! - [`FilesystemFreeBytes`] - [`FreeBytes`] backed by `statvfs`

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod guard;

pub use guard::{
    CAPTURE_SIZE_BYTES, DiskSpaceGuard, FilesystemFreeBytes, FreeBytes, Result, StorageError,
};
