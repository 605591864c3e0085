use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a mood store backend.
///
/// Every store call may fail with one of these; the core never retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached or answered with a server error.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The session is not allowed to perform the call.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An update or delete addressed an id the backend does not know.
    #[error("Mood entry {0} not found")]
    NotFound(i64),
}

/// All errors produced by MoodFlow.
#[derive(Error, Debug)]
pub enum MoodError {
    /// A date string does not start with a `YYYY-MM-DD` calendar day.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// A mood name is not one of the five known categories.
    #[error("Invalid mood: {0}")]
    InvalidMood(String),

    /// A timezone name is not a recognised IANA identifier.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// A snapshot file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the moodflow crates.
pub type Result<T> = std::result::Result<T, MoodError>;
