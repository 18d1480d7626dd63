//! Error types for docgraph.
//!
//! Library crates use [`DocGraphError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docgraph operations.
#[derive(Debug, thiserror::Error)]
pub enum DocGraphError {
    /// A verb's required secondary table was not supplied by the caller.
    #[error("required input table \"{name}\" is missing")]
    MissingInputTable { name: String },

    /// A table lacks a column the operation depends on.
    #[error("table \"{table}\" has no column \"{column}\"")]
    MissingColumn { table: String, column: String },

    /// Malformed table shape (ragged columns, duplicate names, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Configuration loading or verb argument error.
    #[error("config error: {message}")]
    Config { message: String },

    /// No verb is registered under the requested name.
    #[error("unknown verb: {0}")]
    UnknownVerb(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocGraphError>;

impl DocGraphError {
    /// Create a missing-input-table error for the named table.
    pub fn missing_input(name: impl Into<String>) -> Self {
        Self::MissingInputTable { name: name.into() }
    }

    /// Create a missing-column error.
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

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

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
