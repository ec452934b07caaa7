// src/error.rs

//! Unified error handling for the feed splitter.

use std::fmt;
use std::ops::Range;

use thiserror::Error;

/// Result type alias for feed operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Show rule pattern failed to compile
    #[error("Invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The source document lacks the structure the scanner relies on
    #[error("corrupt feed: {0}")]
    CorruptFeed(&'static str),

    /// A retrieval attempt ran past its deadline
    #[error("fetching {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// Feed URL scheme is neither http(s) nor file
    #[error("unsupported feed scheme: {0}")]
    UnsupportedScheme(String),

    /// Two edits planned against one buffer cover the same bytes
    #[error("overlapping edits {first:?} and {second:?}")]
    OverlappingEdits {
        first: Range<usize>,
        second: Range<usize>,
    },

    /// An edit points past the end of its buffer
    #[error("edit {range:?} out of bounds for buffer of {len} bytes")]
    EditOutOfBounds { range: Range<usize>, len: usize },
}

impl AppError {
    /// Create a pattern compilation error.
    pub fn pattern(pattern: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a timeout error for a feed URL.
    pub fn timeout(url: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            url: url.into(),
            secs,
        }
    }
}
