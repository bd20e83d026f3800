//! Global tracing subscriber setup.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when `RUST_LOG` is not set.
const fn level_filter(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "warn";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber: stderr output, plus a plain-text copy
/// appended to `log_file` if given.
///
/// `RUST_LOG` overrides the level derived from `-v` and `--quiet`.
pub(crate) fn init(verbose: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_filter(verbose, quiet)));

    let file_layer = log_file
        .map(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))
        })
        .transpose()?
        .map(|file| {
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file))
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("Failed to install logger")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter() {
        assert_eq!(level_filter(0, false), "info");
        assert_eq!(level_filter(1, false), "debug");
        assert_eq!(level_filter(3, false), "trace");
        assert_eq!(level_filter(2, true), "warn");
    }
}
