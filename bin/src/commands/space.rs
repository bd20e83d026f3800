//! Space command implementation.

use crate::paths;
use anyhow::{Context, Result};
use cosmobot_storage::{CAPTURE_SIZE_BYTES, DiskSpaceGuard, FilesystemFreeBytes};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Print how many more captures fit on the filesystem holding `output_dir`.
pub(crate) fn space(output_dir: Option<PathBuf>) -> Result<ExitCode> {
    let output_dir = output_dir.unwrap_or_else(paths::default_output_dir);
    let queried = existing_ancestor(&output_dir)
        .with_context(|| format!("No existing directory above {}", output_dir.display()))?;

    let guard = DiskSpaceGuard::new(FilesystemFreeBytes::new(queried.to_path_buf()));
    let remaining = guard
        .estimated_remaining_captures()
        .context("Failed to query free space")?;

    println!("Directory:          {}", output_dir.display());
    println!("Capture budget:     {CAPTURE_SIZE_BYTES} bytes");
    println!("Remaining captures: {remaining}");

    if remaining == 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// The path itself if it exists, otherwise its closest existing ancestor.
fn existing_ancestor(path: &Path) -> Option<&Path> {
    path.ancestors()
        .find(|ancestor| !ancestor.as_os_str().is_empty() && ancestor.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_existing_ancestor() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("a/b/c");

        assert_eq!(existing_ancestor(&missing), Some(temp_dir.path()));
        assert_eq!(existing_ancestor(temp_dir.path()), Some(temp_dir.path()));
    }
}
