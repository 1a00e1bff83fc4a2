//! Error types.

use thiserror::Error;

/// Errors that can occur while fetching a snapshot from a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to read the snapshot file.
    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the response body.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The producer side of an in-process source went away.
    #[error("Source closed")]
    Closed,
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if err.is_connect() {
            SourceError::Connection(err.to_string())
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(err.to_string())
    }
}

/// Errors found while loading or validating dashboard configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Two sections share a category name.
    #[error("Duplicate category: {0}")]
    DuplicateCategory(String),

    /// A section has an empty category name.
    #[error("Section {index} has an empty category name")]
    EmptyCategory { index: usize },

    /// A metric has a warning threshold above its critical threshold.
    #[error("Metric {0}: warning threshold is above critical threshold")]
    InvalidThresholds(String),

    /// A duration setting could not be parsed.
    #[error("Invalid duration for {field}: {value}")]
    InvalidDuration { field: &'static str, value: String },

    /// A numeric setting is outside its allowed range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
