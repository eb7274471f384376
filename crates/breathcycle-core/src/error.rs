//! Core error types for breathcycle-core.
//!
//! Only configuration problems are errors. Calling `pause`/`resume`/`stop`
//! outside their precondition is not an error; those calls are ignored.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for breathcycle-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session configuration rejected before a run starts
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration-file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be created
    #[error("Cannot create data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Session configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Numeric field outside its inclusive range
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// Time-of-day that is not `HH:MM`
    #[error("Invalid time of day '{0}': expected HH:MM")]
    InvalidTimeOfDay(String),

    /// Timezone that is not an IANA identifier
    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    /// Clock reading chrono cannot represent
    #[error("Instant {ms}ms is outside the representable range")]
    InvalidInstant { ms: u64 },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
