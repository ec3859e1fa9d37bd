// src/error.rs

//! Unified error handling for the scanner.
//!
//! [`AppError`] covers failures that end a run (configuration, fetching the
//! feed, ledger persistence). Failures that only affect a single notice have
//! their own types and never abort the batch:
//!
//! - [`AcquisitionError`]: the linked document could not be downloaded
//! - [`ExtractionError`]: the downloaded document could not be read
//! - [`DateUnparsed`]: the scraped date text matched no known format
//! - [`HistoryUnavailable`]: not enough snapshots to build a change report

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for scanner operations.
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

    /// CSV reading/writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The notice feed could not be fetched or parsed
    #[error("Fetch error for {context}: {message}")]
    Fetch { context: String, message: String },

    /// Ledger partition could not be read or written. Always fatal.
    #[error("Persistence error at {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
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

    /// Create a feed fetch error with context.
    pub fn fetch(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a ledger persistence error for the given file.
    pub fn persistence(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self::Persistence {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error is a ledger persistence failure.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

/// Why a linked document was not acquired.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionError {
    /// Missing scheme/host, unparsable, or wrong extension
    #[error("invalid document URL: {0}")]
    InvalidUrl(String),

    /// Declared (or streamed) size is above the ceiling
    #[error("document at {url} is {size} bytes, above the {limit} byte limit")]
    SizeLimitExceeded { url: String, size: u64, limit: u64 },

    /// Declared content type is not the expected document type
    #[error("document at {url} has content type '{content_type}'")]
    TypeMismatch { url: String, content_type: String },

    /// Timeout, connection failure, non-success status, or local write failure
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

impl AcquisitionError {
    pub(crate) fn transport(url: &str, message: impl fmt::Display) -> Self {
        Self::Transport {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    /// Short stage label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid_url",
            Self::SizeLimitExceeded { .. } => "size_limit_exceeded",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::Transport { .. } => "transport",
        }
    }
}

/// A downloaded document could not be opened or decoded.
#[derive(Error, Debug)]
#[error("cannot extract text from {}: {message}", path.display())]
pub struct ExtractionError {
    pub path: PathBuf,
    pub message: String,
}

impl ExtractionError {
    pub(crate) fn new(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// The raw date text matched none of the supported formats.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not parse date '{0}'")]
pub struct DateUnparsed(pub String);

/// Change detection was skipped.
#[derive(Error, Debug)]
pub enum HistoryUnavailable {
    /// Fewer than two snapshots exist, counting the current run
    #[error("need at least two snapshots for a change report, found {found}")]
    InsufficientSnapshots { found: usize },

    /// The previous snapshot exists but could not be loaded
    #[error("previous snapshot {key} is unreadable: {message}")]
    UnreadableSnapshot { key: String, message: String },
}
