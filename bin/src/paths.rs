//! Default locations for experiment output and sync logs.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Root directory for cosmobot data.
///
/// - Linux: `~/.local/share/cosmobot/`
/// - macOS: `~/Library/Application Support/cosmobot/`
///
/// Falls back to `~/.cosmobot/` if the platform location cannot be
/// determined.
fn data_dir() -> PathBuf {
    ProjectDirs::from("", "", "cosmobot").map_or_else(dirs_fallback, |proj_dirs| {
        proj_dirs.data_dir().to_path_buf()
    })
}

fn dirs_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".cosmobot")
}

/// Where experiment directories are created unless `--output-dir` is given.
pub(crate) fn default_output_dir() -> PathBuf {
    data_dir().join("output")
}

/// Sync job log for an experiment directory.
///
/// Lives outside the experiment directory so an erasing sync never moves
/// the file it is writing to. Creates the parent directory.
pub(crate) fn sync_log_path(experiment_directory: &Path) -> Result<PathBuf> {
    sync_log_path_in(&data_dir().join("logs"), experiment_directory)
}

fn sync_log_path_in(logs_dir: &Path, experiment_directory: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

    let name = experiment_directory
        .file_name()
        .with_context(|| format!("Invalid experiment directory {}", experiment_directory.display()))?;
    Ok(logs_dir.join(format!("{}-sync.log", name.to_string_lossy())))
}
