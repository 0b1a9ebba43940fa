//! Core error types for unveil-core.
//!
//! Errors only surface at the edges of the library: loading configuration,
//! reading page layouts and validating user-supplied values. The page runtime
//! itself never fails; a missing element or an unsupported host capability
//! skips the affected feature instead.

use std::path::PathBuf;
use thiserror::Error;

use crate::reveal::RevealState;

/// Core error type for unveil-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Page layout description could not be read or parsed
    #[error("Layout error: {0}")]
    Layout(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
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

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// Month/day pair cannot describe an annual window
    #[error("Invalid annual window: month {month} (0-11), day {day} (1-31)")]
    InvalidWindow { month: u32, day: u32 },

    /// Numeric value outside its accepted range
    #[error("Value for '{field}' out of range: {value} (expected {expected})")]
    OutOfRange {
        field: String,
        value: f64,
        expected: String,
    },
}

/// A reveal state change that would move backwards or skip a required step.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Illegal reveal transition: {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: RevealState,
    pub to: RevealState,
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
