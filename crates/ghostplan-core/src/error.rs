//! Core error types for ghostplan-core.
//!
//! This module defines the error hierarchy using thiserror. Nothing here is
//! fatal to the planner: generator and commit failures are recovered where
//! they happen, and only caller mistakes such as an inverted interval are
//! surfaced as hard errors.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for ghostplan-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Calendar store errors
    #[error("Calendar error: {0}")]
    Calendar(#[from] CalendarError),

    /// Suggestion generator errors
    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    /// Unknown dotted configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Config directory could not be created or located
    #[error("Config directory unavailable: {0}")]
    DirUnavailable(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end_time ({end}) must be greater than start_time ({start})")]
    InvalidTimeRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Errors reported by a calendar store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// The store refused to persist a block
    #[error("Commit rejected for '{title}': {message}")]
    CommitRejected { title: String, message: String },

    /// The store is unreachable
    #[error("Calendar store unavailable: {0}")]
    Unavailable(String),
}

/// Errors reported by a suggestion generator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    /// Upstream service failed or timed out
    #[error("Suggestion service failed: {0}")]
    ServiceFailed(String),

    /// Response could not be understood
    #[error("Malformed suggestion response: {0}")]
    Malformed(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
