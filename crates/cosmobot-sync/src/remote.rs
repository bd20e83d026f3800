//! Remote sync command construction.

use crate::{Result, SyncError, SyncOptions};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Glob excluded from syncs that do not include logs.
pub const LOG_FILE_PATTERN: &str = "*.log*";

/// Builds the command that uploads a directory to remote storage.
///
/// The command's exit status is the only success signal. Reruns must be
/// safe: the tool is expected to skip files already uploaded.
pub trait RemoteSync {
    /// Returns the command syncing `directory` with the given options.
    ///
    /// # Errors
    ///
    /// Returns an error if no command can be built for the directory.
    fn command(&self, directory: &Path, options: &SyncOptions) -> Result<Command>;
}

impl<R: RemoteSync + ?Sized> RemoteSync for &R {
    fn command(&self, directory: &Path, options: &SyncOptions) -> Result<Command> {
        (**self).command(directory, options)
    }
}

/// [`RemoteSync`] using the `aws s3` command line tool.
///
/// `aws s3 sync` is a one-way upload; `aws s3 mv --recursive` uploads and
/// deletes the local copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsS3Sync {
    bucket: String,
    program: PathBuf,
}

impl Default for AwsS3Sync {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BUCKET)
    }
}

impl AwsS3Sync {
    /// Bucket experiments are uploaded to unless configured otherwise.
    pub const DEFAULT_BUCKET: &'static str = "camera-sensor-experiments";

    /// Syncs into `bucket` using `aws` from `PATH`.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            program: PathBuf::from("aws"),
        }
    }

    /// Uses a specific `aws` executable.
    #[must_use]
    pub fn with_program(mut self, program: PathBuf) -> Self {
        self.program = program;
        self
    }

    /// Returns the target bucket.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Remote location for a local experiment directory:
    /// `s3://<bucket>/<directory name>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory has no final component.
    pub fn destination(&self, directory: &Path) -> Result<String> {
        let name = directory
            .file_name()
            .ok_or_else(|| SyncError::InvalidDirectory {
                path: directory.to_path_buf(),
            })?;
        Ok(format!("s3://{}/{}", self.bucket, name.to_string_lossy()))
    }
}

impl RemoteSync for AwsS3Sync {
    fn command(&self, directory: &Path, options: &SyncOptions) -> Result<Command> {
        let destination = self.destination(directory)?;

        let mut command = Command::new(&self.program);
        command.arg("s3");
        if options.erase_after_upload {
            command
                .arg("mv")
                .arg(directory)
                .arg(&destination)
                .arg("--recursive");
        } else {
            command.arg("sync").arg(directory).arg(&destination);
        }
        if !options.include_logs {
            command.args(["--exclude", LOG_FILE_PATTERN]);
        }

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(command: &Command) -> Vec<String> {
        command
            .as_std()
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_destination_uses_directory_name() {
        let remote = AwsS3Sync::default();
        let destination = remote
            .destination(Path::new("/home/pi/output/2024-01-01--00-00-00-run/"))
            .unwrap();

        assert_eq!(
            destination,
            "s3://camera-sensor-experiments/2024-01-01--00-00-00-run"
        );
    }

    #[test]
    fn test_destination_rejects_root() {
        let remote = AwsS3Sync::new("bucket");
        assert!(matches!(
            remote.destination(Path::new("/")),
            Err(SyncError::InvalidDirectory { .. })
        ));
    }

    #[test]
    fn test_ongoing_sync_excludes_logs() {
        let remote = AwsS3Sync::new("bucket");
        let command = remote
            .command(Path::new("/data/exp"), &SyncOptions::ongoing())
            .unwrap();

        assert_eq!(command.as_std().get_program(), "aws");
        assert_eq!(
            args(&command),
            ["s3", "sync", "/data/exp", "s3://bucket/exp", "--exclude", "*.log*"]
        );
    }

    #[test]
    fn test_final_sync_includes_logs() {
        let remote = AwsS3Sync::new("bucket");
        let command = remote
            .command(Path::new("/data/exp"), &SyncOptions::final_sync(false, None))
            .unwrap();

        assert_eq!(args(&command), ["s3", "sync", "/data/exp", "s3://bucket/exp"]);
    }

    #[test]
    fn test_erase_uses_recursive_move() {
        let remote = AwsS3Sync::new("bucket").with_program(PathBuf::from("/usr/local/bin/aws"));
        let command = remote
            .command(Path::new("/data/exp"), &SyncOptions::final_sync(true, None))
            .unwrap();

        assert_eq!(command.as_std().get_program(), "/usr/local/bin/aws");
        assert_eq!(
            args(&command),
            ["s3", "mv", "/data/exp", "s3://bucket/exp", "--recursive"]
        );
    }
}
