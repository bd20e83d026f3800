//! Error types for configuration and variant parsing.

use thiserror::Error;

/// Errors produced while parsing a `--variant` parameter string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VariantParseError {
    /// A flag that takes a value was the last token.
    #[error("Missing value for {flag}")]
    MissingValue {
        /// The flag missing its value.
        flag: String,
    },

    /// A flag value could not be parsed.
    #[error("Invalid value '{value}' for {flag}")]
    InvalidValue {
        /// The flag whose value was rejected.
        flag: String,
        /// The rejected value.
        value: String,
    },

    /// Shutter speed passed through the raw capture parameters.
    #[error(
        "Setting shutter speed via -ss is no longer supported. Please use --exposure-time or -ex in seconds."
    )]
    ShutterSpeed,

    /// Warm-up time passed through the raw capture parameters.
    #[error(
        "Setting camera warm-up time via --timeout is no longer supported. Please use --camera-warm-up in seconds."
    )]
    Timeout,
}

/// Errors for an invalid run configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The experiment name is empty.
    #[error("Experiment name must not be empty")]
    EmptyName,

    /// The experiment name cannot be used as a directory name.
    #[error("Experiment name '{0}' must not contain path separators")]
    InvalidName(String),

    /// The capture interval is zero.
    #[error("Capture interval must be greater than zero")]
    ZeroInterval,
}
