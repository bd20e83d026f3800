//! Test doubles for the experiment loop.

use crate::{Capture, CaptureError, Experiment};
use async_trait::async_trait;
use cosmobot_storage::{CAPTURE_SIZE_BYTES, DiskSpaceGuard, FreeBytes};
use cosmobot_sync::{RemoteSync, SyncManager, SyncOptions};
use cosmobot_types::{RunConfig, Variant};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::Instant;

/// Free space shared between the guard and a filling capture.
#[derive(Debug, Clone)]
pub(crate) struct FixedFreeBytes(Arc<AtomicU64>);

impl FixedFreeBytes {
    pub(crate) fn new(free: u64) -> Self {
        Self(Arc::new(AtomicU64::new(free)))
    }

    pub(crate) fn plenty() -> Self {
        Self::new(1_000 * CAPTURE_SIZE_BYTES)
    }
}

impl FreeBytes for FixedFreeBytes {
    fn free_bytes(&self) -> cosmobot_storage::Result<u64> {
        Ok(self.0.load(Ordering::SeqCst))
    }
}

/// Records when each capture starts and with which variant, and writes an
/// empty file per capture.
#[derive(Debug, Default)]
pub(crate) struct RecordingCapture {
    calls: Mutex<Vec<(Instant, String)>>,
    delay: Duration,
    fail_after: Option<usize>,
    fills: Option<FixedFreeBytes>,
}

impl RecordingCapture {
    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Succeeds `successes` times, then fails every capture.
    pub(crate) fn failing_after(successes: usize) -> Self {
        Self {
            fail_after: Some(successes),
            ..Self::default()
        }
    }

    /// Takes one capture budget from `free` per capture.
    pub(crate) fn filling(mut self, free: &FixedFreeBytes) -> Self {
        self.fills = Some(free.clone());
        self
    }

    pub(crate) fn calls(&self) -> Vec<(Instant, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Capture for RecordingCapture {
    async fn capture(&self, directory: &Path, variant: &Variant) -> Result<PathBuf, CaptureError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((Instant::now(), variant.label()));
            calls.len()
        };
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let path = directory.join(format!("{index:04}_{}_.jpeg", variant.label()));
        if self.fail_after.is_some_and(|successes| index > successes) {
            return Err(CaptureError::Copy {
                from: PathBuf::from("camera"),
                to: path,
                source: std::io::Error::other("sensor unavailable"),
            });
        }

        std::fs::write(&path, b"").unwrap();
        if let Some(free) = &self.fills {
            free.0.fetch_sub(CAPTURE_SIZE_BYTES, Ordering::SeqCst);
        }
        Ok(path)
    }
}

/// Runs `script` through `/bin/sh` with the synced directory as `$1`,
/// recording the options of every job it is asked to start.
#[derive(Debug)]
pub(crate) struct ShellSync {
    program: PathBuf,
    script: String,
    requests: Mutex<Vec<SyncOptions>>,
}

impl ShellSync {
    pub(crate) fn new(script: &str) -> Self {
        Self {
            program: PathBuf::from("/bin/sh"),
            script: script.to_string(),
            requests: Mutex::default(),
        }
    }

    /// Runs `program` instead of the shell, e.g. one that does not exist.
    pub(crate) fn with_program(program: &str) -> Self {
        Self {
            program: PathBuf::from(program),
            ..Self::new("exit 0")
        }
    }

    pub(crate) fn requests(&self) -> Vec<SyncOptions> {
        self.requests.lock().unwrap().clone()
    }
}

impl RemoteSync for ShellSync {
    fn command(&self, directory: &Path, options: &SyncOptions) -> cosmobot_sync::Result<Command> {
        self.requests.lock().unwrap().push(*options);
        let mut command = Command::new(&self.program);
        command.arg("-c").arg(&self.script).arg("sh").arg(directory);
        Ok(command)
    }
}

/// Interrupts once after `delay`; later interrupts never fire.
pub(crate) fn interrupt_once(
    delay: Duration,
) -> impl FnMut() -> Pin<Box<dyn Future<Output = ()>>> {
    let mut fired = false;
    move || -> Pin<Box<dyn Future<Output = ()>>> {
        if std::mem::replace(&mut fired, true) {
            Box::pin(std::future::pending())
        } else {
            Box::pin(tokio::time::sleep(delay))
        }
    }
}

/// A run writing into `directory` with the default variant.
pub(crate) fn run_config(directory: &Path, interval: Duration) -> RunConfig {
    RunConfig::new("test", interval, directory)
        .unwrap()
        .with_experiment_directory(directory.to_path_buf())
}

pub(crate) fn experiment<'a>(
    config: RunConfig,
    capture: &'a RecordingCapture,
    free: &'a FixedFreeBytes,
    remote: &'a ShellSync,
) -> Experiment<&'a RecordingCapture, &'a FixedFreeBytes, &'a ShellSync> {
    Experiment::new(
        config,
        capture,
        DiskSpaceGuard::new(free),
        SyncManager::new(remote),
    )
}
