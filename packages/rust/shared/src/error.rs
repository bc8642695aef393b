//! Error types for prdocs.
//!
//! Library crates use [`PrDocsError`] via `thiserror`.
//! The `prdocs` binary wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all prdocs operations.
#[derive(Debug, thiserror::Error)]
pub enum PrDocsError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The pull-request file listing call did not complete.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The pull-request file listing could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Raw content for a single changed file could not be fetched.
    #[error("content unavailable for {url}: {message}")]
    ContentUnavailable { url: String, message: String },

    /// The AI generation endpoint errored or returned a non-success status.
    #[error("AI service error: {0}")]
    ServiceError(String),

    /// The AI generation response lacked the expected candidate shape.
    #[error("malformed AI response: {0}")]
    MalformedAiResponse(String),

    /// A document could not be written under the docs root.
    #[error("persistence error at {path:?}: {message}")]
    Persistence { path: PathBuf, message: String },

    /// Data validation error (bad repository name, missing payload field, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PrDocsError>;

impl PrDocsError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a content error for the given raw-content URL.
    pub fn content(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ContentUnavailable {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Create a persistence error with a path for context.
    pub fn persistence(path: impl Into<PathBuf>, msg: impl ToString) -> Self {
        Self::Persistence {
            path: path.into(),
            message: msg.to_string(),
        }
    }

    /// Whether this error is scoped to a single changed file.
    ///
    /// Per-file errors are recorded against that file and never abort a batch.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::ContentUnavailable { .. }
                | Self::Persistence { .. }
                | Self::ServiceError(_)
                | Self::MalformedAiResponse(_)
        )
    }
}
