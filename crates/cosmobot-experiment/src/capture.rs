//! Capture collaborators.
//!
//! The scheduler treats capture as an opaque, fallible call that produces
//! one file per variant.

use crate::CaptureError;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use cosmobot_types::{Variant, iso_datetime_for_filename};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// JPEG quality passed to `raspistill`.
const JPEG_QUALITY: u8 = 100;

/// Auto-white-balance (red, blue) gains. These only affect the JPEG.
const AWB_GAINS: (f64, f64) = (1.307, 1.615);

/// Produces one capture file for a variant.
#[async_trait]
pub trait Capture: Send + Sync {
    /// Captures into `directory` with the settings of `variant` and returns
    /// the path of the new file.
    ///
    /// # Errors
    ///
    /// Returns an error if the capture device or command fails.
    async fn capture(&self, directory: &Path, variant: &Variant) -> Result<PathBuf, CaptureError>;
}

#[async_trait]
impl<C: Capture + ?Sized> Capture for &C {
    async fn capture(&self, directory: &Path, variant: &Variant) -> Result<PathBuf, CaptureError> {
        (**self).capture(directory, variant).await
    }
}

/// File name for a capture taken at `taken_at` with `variant`:
/// `<timestamp>_<variant label>_.jpeg`.
#[must_use]
pub fn capture_filename(taken_at: &DateTime<Local>, variant: &Variant) -> String {
    format!(
        "{}_{}_.jpeg",
        iso_datetime_for_filename(taken_at),
        variant.label()
    )
}

/// Removes a partially written capture unless disarmed.
///
/// The camera creates the output file before filling it; an interrupted or
/// failed capture would otherwise leave an empty file that breaks
/// downstream processing.
#[derive(Debug)]
struct PartialFile<'a> {
    path: &'a Path,
    armed: bool,
}

impl<'a> PartialFile<'a> {
    const fn new(path: &'a Path) -> Self {
        Self { path, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFile<'_> {
    fn drop(&mut self) {
        if self.armed && self.path.exists() {
            info!(path = %self.path.display(), "Deleting incomplete capture");
            let _ = std::fs::remove_file(self.path);
        }
    }
}

/// Captures raw JPEG+EXIF images with the `raspistill` command.
#[derive(Debug, Clone)]
pub struct RaspistillCapture {
    program: PathBuf,
}

impl Default for RaspistillCapture {
    fn default() -> Self {
        Self {
            program: PathBuf::from("raspistill"),
        }
    }
}

impl RaspistillCapture {
    /// Uses a specific `raspistill` executable.
    #[must_use]
    pub const fn with_program(program: PathBuf) -> Self {
        Self { program }
    }

    /// Builds the `raspistill` invocation writing to `path`.
    #[must_use]
    pub fn command(&self, path: &Path, variant: &Variant) -> Command {
        let exposure_micros = (variant.exposure_time * 1e6).round() as u64;
        let warm_up_millis = (variant.camera_warm_up * 1e3).round() as u64;

        let mut command = Command::new(&self.program);
        command
            .arg("--raw")
            .arg("-o")
            .arg(path)
            .arg("-q")
            .arg(JPEG_QUALITY.to_string())
            .args(["-awb", "off"])
            .arg("-awbg")
            .arg(format!("{},{}", AWB_GAINS.0, AWB_GAINS.1))
            .arg("-ss")
            .arg(exposure_micros.to_string())
            .arg("-ISO")
            .arg(variant.iso.to_string())
            .arg("--timeout")
            .arg(warm_up_millis.to_string())
            .args(variant.additional_capture_params.split_whitespace())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl Capture for RaspistillCapture {
    async fn capture(&self, directory: &Path, variant: &Variant) -> Result<PathBuf, CaptureError> {
        let path = directory.join(capture_filename(&Local::now(), variant));
        let mut command = self.command(&path, variant);
        debug!(command = ?command.as_std(), "Capturing image using raspistill");

        let partial = PartialFile::new(&path);
        let status = command.status().await.map_err(|source| CaptureError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        if !status.success() {
            return Err(CaptureError::Failed {
                program: self.program.clone(),
                status,
            });
        }
        partial.disarm();

        Ok(path)
    }
}

/// Simulates a capture by copying a sample image into place.
#[derive(Debug, Clone)]
pub struct CopyCapture {
    sample: PathBuf,
}

impl CopyCapture {
    /// Copies `sample` for every capture.
    #[must_use]
    pub const fn new(sample: PathBuf) -> Self {
        Self { sample }
    }
}

#[async_trait]
impl Capture for CopyCapture {
    async fn capture(&self, directory: &Path, variant: &Variant) -> Result<PathBuf, CaptureError> {
        let path = directory.join(capture_filename(&Local::now(), variant));

        let partial = PartialFile::new(&path);
        tokio::fs::copy(&self.sample, &path)
            .await
            .map_err(|source| CaptureError::Copy {
                from: self.sample.clone(),
                to: path.clone(),
                source,
            })?;
        partial.disarm();

        Ok(path)
    }
}
