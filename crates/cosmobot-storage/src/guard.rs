//! Disk space guard.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound on the on-disk size of one capture, in bytes.
///
/// Raw captures from the Sony IMX sensor max out at 1.6 MB.
pub const CAPTURE_SIZE_BYTES: u64 = 1_600_000;

/// Errors that can occur while querying free space.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The filesystem statistics call failed.
    #[error("Failed to read filesystem statistics for '{path}': {source}")]
    Statistics {
        /// The path that was queried.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Free space cannot be queried on this platform.
    #[error("Free space queries are not supported on this platform")]
    Unsupported,
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Source of the current number of free bytes.
///
/// Free space is volatile external state; implementations must query it
/// fresh on every call.
pub trait FreeBytes {
    /// Returns the number of bytes available to unprivileged writers.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying query fails.
    fn free_bytes(&self) -> Result<u64>;
}

impl<F: FreeBytes + ?Sized> FreeBytes for &F {
    fn free_bytes(&self) -> Result<u64> {
        (**self).free_bytes()
    }
}

/// [`FreeBytes`] for the filesystem containing a path.
#[derive(Debug, Clone)]
pub struct FilesystemFreeBytes {
    path: PathBuf,
}

impl FilesystemFreeBytes {
    /// Queries the filesystem that holds `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the queried path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FreeBytes for FilesystemFreeBytes {
    #[cfg(unix)]
    fn free_bytes(&self) -> Result<u64> {
        let stat =
            nix::sys::statvfs::statvfs(&self.path).map_err(|e| StorageError::Statistics {
                path: self.path.clone(),
                source: e.into(),
            })?;

        Ok(u64::from(stat.blocks_available()) * u64::from(stat.fragment_size()))
    }

    #[cfg(not(unix))]
    fn free_bytes(&self) -> Result<u64> {
        Err(StorageError::Unsupported)
    }
}

/// Answers whether there is room for more captures.
#[derive(Debug, Clone)]
pub struct DiskSpaceGuard<F> {
    source: F,
    capture_size: u64,
}

impl<F: FreeBytes> DiskSpaceGuard<F> {
    /// Creates a guard using the default per-capture budget.
    #[must_use]
    pub const fn new(source: F) -> Self {
        Self::with_capture_size(source, CAPTURE_SIZE_BYTES)
    }

    /// Creates a guard with a custom per-capture budget.
    ///
    /// A budget of zero is treated as one byte.
    #[must_use]
    pub const fn with_capture_size(source: F, capture_size: u64) -> Self {
        let capture_size = if capture_size == 0 { 1 } else { capture_size };
        Self {
            source,
            capture_size,
        }
    }

    /// Returns the per-capture byte budget.
    #[must_use]
    pub const fn capture_size(&self) -> u64 {
        self.capture_size
    }

    /// Returns true if there is room for `count` more captures.
    ///
    /// # Errors
    ///
    /// Returns an error if free space cannot be queried.
    pub fn has_space_for(&self, count: u64) -> Result<bool> {
        let free = self.source.free_bytes()?;
        Ok(free >= self.capture_size.saturating_mul(count))
    }

    /// Returns true if there is room for one more capture.
    ///
    /// Exactly one budget's worth of free space counts as room.
    ///
    /// # Errors
    ///
    /// Returns an error if free space cannot be queried.
    pub fn free_space_for_one_capture(&self) -> Result<bool> {
        self.has_space_for(1)
    }

    /// Estimates how many more captures fit in free space.
    ///
    /// # Errors
    ///
    /// Returns an error if free space cannot be queried.
    pub fn estimated_remaining_captures(&self) -> Result<u64> {
        Ok(self.source.free_bytes()? / self.capture_size)
    }
}
