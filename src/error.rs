//! Error types for notecore.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias for notecore operations
pub type NoteResult<T> = Result<T, NoteError>;

/// How an error should be presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The action was refused but nothing is wrong (e.g. tag already present)
    Warning,
    /// The action failed
    Error,
}

/// Main error type for notecore operations
#[derive(Error, Debug)]
pub enum NoteError {
    #[error("Validation error in {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Duplicate {field}: {value}")]
    Duplicate { field: String, value: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt document '{key}': {source}")]
    CorruptDocument {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl NoteError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        NoteError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new duplicate-value error
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        NoteError::Duplicate {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        NoteError::NotFound(what.into())
    }

    /// Severity used when surfacing this error as a notification
    pub fn severity(&self) -> Severity {
        match self {
            NoteError::Duplicate { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}
