//! Error types for LeadScout.
//!
//! Library crates use [`LeadScoutError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all LeadScout operations.
#[derive(Debug, thiserror::Error)]
pub enum LeadScoutError {
    /// Configuration loading or validation error, including missing credentials.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error not scoped to a specific pipeline operation.
    #[error("network error: {0}")]
    Network(String),

    /// Profile search failed (transport or non-success status).
    #[error("search failed: {0}")]
    Search(String),

    /// Structured extraction failed for one URL.
    #[error("extract failed for {url}: {message}")]
    Extract { url: String, message: String },

    /// Response body could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The automation service did not return a usable spreadsheet.
    #[error("spreadsheet creation failed: {0}")]
    SheetCreation(String),

    /// Writing rows to the spreadsheet failed.
    #[error("sheet export failed: {0}")]
    Export(String),

    /// The automation client exposes none of the expected invocation methods.
    #[error("capability error: automation client exposes none of [{}]", candidates.join(", "))]
    Capability { candidates: Vec<String> },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (limit out of range, malformed URL, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LeadScoutError>;

impl LeadScoutError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an extraction error scoped to one URL.
    pub fn extract(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Extract {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this is a configuration problem rather than a runtime failure.
    ///
    /// The CLI uses this to print setup hints instead of a failure report.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}
