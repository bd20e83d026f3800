//! Capture scheduling loop and shutdown for cosmobot experiments.
//!
//! - [`Experiment`] - Drives the capture cadence and funnels every ending
//!   through [`Experiment::shutdown`]
//! - [`ScheduleClock`] - Next nominal capture instant
//! - [`Capture`] - Capture collaborator, with [`RaspistillCapture`] and
//!   [`CopyCapture`] implementations
//! - [`interrupted`] - Resolves on Ctrl-C or `SIGTERM`

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod capture;
mod clock;
mod error;
mod experiment;
mod shutdown;
mod signal;

#[cfg(test)]
mod testing;

pub use capture::{Capture, CopyCapture, RaspistillCapture, capture_filename};
pub use clock::ScheduleClock;
pub use error::{CaptureError, RunError};
pub use experiment::Experiment;
pub use signal::interrupted;
