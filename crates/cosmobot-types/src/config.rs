//! Run configuration.

use crate::{ConfigError, Variant, iso_datetime_for_filename};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Immutable configuration for one experiment run.
///
/// Built once at startup and owned by the scheduler for the life of the run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Name of the experiment, used for the output directory name.
    pub name: String,
    /// Nominal time between the start of two batches.
    pub interval: Duration,
    /// Total run time. `None` runs until interrupted or out of space.
    pub duration: Option<Duration>,
    /// Capture settings, applied in order once per batch.
    pub variants: Vec<Variant>,
    /// Directory captures are written to and synced from.
    pub experiment_directory: PathBuf,
    /// Wall-clock start of the run.
    pub start_date: DateTime<Local>,
    /// Never sync to remote storage.
    pub skip_sync: bool,
    /// Move files to remote storage in the final sync and remove the local directory.
    pub erase_synced_files: bool,
    /// Upper bound on the final blocking sync. `None` waits indefinitely.
    pub final_sync_timeout: Option<Duration>,
}

impl RunConfig {
    /// Creates a configuration starting now, writing into a new
    /// `<timestamp>-<name>` directory under `output_root`.
    ///
    /// Uses the default variant and runs indefinitely with sync enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or contains a path separator,
    /// or if the interval is zero.
    pub fn new(name: &str, interval: Duration, output_root: &Path) -> Result<Self, ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidName(name.to_string()));
        }
        if interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }

        let start_date = Local::now();
        let experiment_directory =
            output_root.join(Self::experiment_directory_name(&start_date, name));

        Ok(Self {
            name: name.to_string(),
            interval,
            duration: None,
            variants: vec![Variant::default()],
            experiment_directory,
            start_date,
            skip_sync: false,
            erase_synced_files: false,
            final_sync_timeout: None,
        })
    }

    /// Directory name for an experiment started at `start_date`.
    #[must_use]
    pub fn experiment_directory_name(start_date: &DateTime<Local>, name: &str) -> String {
        format!("{}-{name}", iso_datetime_for_filename(start_date))
    }

    /// Sets the total run time.
    #[must_use]
    pub const fn with_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }

    /// Replaces the variant list. An empty list keeps the default variant.
    #[must_use]
    pub fn with_variants(mut self, variants: Vec<Variant>) -> Self {
        if !variants.is_empty() {
            self.variants = variants;
        }
        self
    }

    /// Overrides the experiment directory.
    #[must_use]
    pub fn with_experiment_directory(mut self, directory: PathBuf) -> Self {
        self.experiment_directory = directory;
        self
    }

    /// Sets the sync flags.
    #[must_use]
    pub const fn with_sync(mut self, skip_sync: bool, erase_synced_files: bool) -> Self {
        self.skip_sync = skip_sync;
        self.erase_synced_files = erase_synced_files;
        self
    }

    /// Bounds the final blocking sync.
    #[must_use]
    pub const fn with_final_sync_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.final_sync_timeout = timeout;
        self
    }
}
