//! Run command implementation.
//!
//! Builds the run configuration from the command line, creates the
//! experiment directory, wires the capture, disk space and sync
//! collaborators together and runs the experiment to completion.

use crate::{logging, paths};
use anyhow::{Context, Result};
use clap::Args;
use cosmobot_experiment::{CopyCapture, Experiment, RaspistillCapture};
use cosmobot_storage::{DiskSpaceGuard, FilesystemFreeBytes};
use cosmobot_sync::{AwsS3Sync, SyncManager};
use cosmobot_types::{RunConfig, Variant, iso_datetime_for_filename};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Arguments for `cosmobot run`.
#[derive(Args, Debug)]
pub(crate) struct RunArgs {
    /// Name for the experiment, used in the output directory name
    #[arg(long)]
    name: String,

    /// Interval between the start of two capture batches, in seconds
    #[arg(long, value_parser = parse_seconds)]
    interval: Duration,

    /// Duration in seconds. Runs until interrupted or out of space if omitted.
    #[arg(long, value_parser = parse_seconds)]
    duration: Option<Duration>,

    /// Capture settings, e.g. "-ex 0.5 -i 200 -w 640". Repeat for several variants.
    /// Unknown flags are passed through to raspistill.
    #[arg(long = "variant", allow_hyphen_values = true)]
    variants: Vec<Variant>,

    /// Exposure times to iterate through, in seconds
    #[arg(long, num_args = 1..)]
    exposures: Vec<f64>,

    /// ISO values to iterate through
    #[arg(long, num_args = 1..)]
    isos: Vec<u32>,

    /// Never sync files to S3
    #[arg(long)]
    skip_sync: bool,

    /// Move files to S3 in the final sync and remove the local directory
    #[arg(long)]
    erase_synced_files: bool,

    /// Directory experiment directories are created in
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// S3 bucket to sync to
    #[arg(long, default_value = AwsS3Sync::DEFAULT_BUCKET)]
    bucket: String,

    /// Give up on the final sync after this many seconds (default: wait indefinitely)
    #[arg(long, value_parser = parse_seconds)]
    final_sync_timeout: Option<Duration>,

    /// Copy this image for every capture instead of using the camera
    #[arg(long)]
    simulate_from: Option<PathBuf>,
}

impl RunArgs {
    /// Parsed variants followed by the exposure/ISO grid. Empty if neither
    /// was given.
    fn variants(&self) -> Vec<Variant> {
        let mut variants = self.variants.clone();
        if !self.exposures.is_empty() || !self.isos.is_empty() {
            variants.extend(Variant::grid(&self.exposures, &self.isos));
        }
        variants
    }

    fn config(&self) -> Result<RunConfig> {
        let output_root = self
            .output_dir
            .clone()
            .unwrap_or_else(paths::default_output_dir);

        let config = RunConfig::new(&self.name, self.interval, &output_root)
            .context("Invalid experiment configuration")?
            .with_duration(self.duration)
            .with_variants(self.variants())
            .with_sync(self.skip_sync, self.erase_synced_files)
            .with_final_sync_timeout(self.final_sync_timeout);
        Ok(config)
    }
}

/// Parses a non-negative number of seconds.
fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a number of seconds"))?;
    Duration::try_from_secs_f64(secs).map_err(|_| format!("'{s}' is not a valid duration"))
}

/// Runs an experiment and returns its exit status.
pub(crate) async fn run(args: RunArgs, verbose: u8, quiet: bool) -> Result<ExitCode> {
    let config = args.config()?;
    let directory = config.experiment_directory.clone();
    std::fs::create_dir_all(&directory).with_context(|| {
        format!("Failed to create experiment directory {}", directory.display())
    })?;

    let log_file = directory.join(format!(
        "{}_experiment.log",
        iso_datetime_for_filename(&config.start_date)
    ));
    logging::init(verbose, quiet, Some(&log_file))?;

    let sync_log = paths::sync_log_path(&directory)?;
    let sync = SyncManager::new(AwsS3Sync::new(&args.bucket)).with_log_file(sync_log);
    let guard = DiskSpaceGuard::new(FilesystemFreeBytes::new(directory));

    let outcome = match args.simulate_from {
        Some(sample) => {
            Experiment::new(config, CopyCapture::new(sample), guard, sync)
                .run()
                .await
        }
        None => {
            Experiment::new(config, RaspistillCapture::default(), guard, sync)
                .run()
                .await
        }
    };

    Ok(ExitCode::from(outcome.exit_code()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: RunArgs,
    }

    fn parse(args: &[&str]) -> RunArgs {
        TestCli::try_parse_from(std::iter::once("cosmobot").chain(args.iter().copied()))
            .unwrap()
            .args
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("1.5"), Ok(Duration::from_millis(1500)));
        assert_eq!(parse_seconds("0"), Ok(Duration::ZERO));
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("soon").is_err());
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["--name", "test", "--interval", "60"]);

        assert_eq!(args.interval, Duration::from_secs(60));
        assert_eq!(args.duration, None);
        assert_eq!(args.bucket, AwsS3Sync::DEFAULT_BUCKET);
        assert!(args.variants().is_empty());

        let config = args.config().unwrap();
        assert_eq!(config.variants, [Variant::default()]);
        assert!(!config.skip_sync);
        assert!(!config.erase_synced_files);
    }

    #[test]
    fn test_variant_flags_with_hyphen_values() {
        let args = parse(&[
            "--name",
            "test",
            "--interval",
            "10",
            "--variant",
            "-ex 0.5 -i 200",
            "--variant",
            "--exposure-time 0.1 -w 640",
        ]);

        let variants = args.variants();
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].iso, 200);
        assert_eq!(variants[1].additional_capture_params, "-w 640");
    }

    #[test]
    fn test_grid_appended_to_variants() {
        let args = parse(&[
            "--name",
            "test",
            "--interval",
            "10",
            "--variant",
            "-i 400",
            "--exposures",
            "0.1",
            "0.2",
            "--isos",
            "100",
        ]);

        let variants = args.variants();
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0].iso, 400);
        assert_eq!(variants[1], Variant::new(0.1, 100));
        assert_eq!(variants[2], Variant::new(0.2, 100));
    }

    #[test]
    fn test_rejected_variant_fails_parse() {
        let result = TestCli::try_parse_from([
            "cosmobot",
            "--name",
            "test",
            "--interval",
            "10",
            "--variant",
            "-ss 100000",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_name_fails_config() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let output_dir = temp_dir.path().to_string_lossy().into_owned();
        let args = parse(&["--name", "a/b", "--interval", "10", "--output-dir", &output_dir]);

        assert!(args.config().is_err());
    }

    #[test]
    fn test_zero_interval_fails_config() {
        let args = parse(&["--name", "test", "--interval", "0"]);
        assert!(args.config().is_err());
    }
}
