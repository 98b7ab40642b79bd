//! Error types

use thiserror::Error;

/// Main error type for PR Insight
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid timestamp in {field}: {value:?}")]
    InvalidTimestamp { field: String, value: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("GitHub API error: {0}")]
    GitHub(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Snapshot decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
