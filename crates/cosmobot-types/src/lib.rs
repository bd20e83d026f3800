//! Core types for cosmobot capture experiments.
//!
//! This crate provides the value types shared by the scheduler, the sync
//! manager and the command line:
//!
//! - [`RunConfig`] - Immutable configuration for one experiment run
//! - [`Variant`] - One set of capture settings applied once per batch
//! - [`EndReason`] - Why an experiment run stopped
//! - [`Outcome`] - Final result of a run, including its exit code

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod naming;
mod outcome;
mod variant;

pub use config::RunConfig;
pub use error::{ConfigError, VariantParseError};
pub use naming::{FILENAME_DATETIME_FORMAT, iso_datetime_for_filename};
pub use outcome::{EndReason, FinalSync, Outcome};
pub use variant::{
    DEFAULT_EXPOSURE_TIME, DEFAULT_ISO, DEFAULT_WARM_UP_TIME, VARIANT_WARM_UP_TIME, Variant,
};
