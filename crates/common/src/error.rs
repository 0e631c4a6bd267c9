//! Shared error types used across segcat crates.

use thiserror::Error;

/// Path-related errors shared across crates.
#[derive(Debug, Error, Clone)]
pub enum PathError {
    /// Path is invalid or malformed.
    #[error("Invalid path: {path}")]
    InvalidPath {
        /// The invalid path.
        path: String,
    },

    /// IO error occurred while accessing path.
    #[error("IO error at {path}: {message}")]
    IoError {
        /// Path where error occurred.
        path: String,
        /// Error message.
        message: String,
    },
}

impl PathError {
    /// Create an IoError from std::io::Error.
    ///
    /// # Arguments
    /// * `path` - Path where the error occurred
    /// * `err` - The underlying IO error
    pub fn from_io(path: impl Into<String>, err: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Errors from parsing a numeric permission mode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModeError {
    /// The mode string was empty.
    #[error("Permission mode is empty")]
    Empty,

    /// The mode string contained a non-octal character.
    #[error("Permission mode is not octal: {value}")]
    NotOctal {
        /// The rejected input.
        value: String,
    },

    /// The mode has bits set outside owner/group/other permissions.
    #[error("Permission mode {value:#o} exceeds {max:#o}")]
    OutOfRange {
        /// The parsed mode.
        value: u32,
        /// Highest accepted mode.
        max: u16,
    },
}
