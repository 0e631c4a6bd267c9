//! Error types for backing file discovery and validation.

use std::path::PathBuf;

use segcat_common::PathError;
use thiserror::Error;

/// Errors that can occur while locating backing files.
#[derive(Debug, Error)]
pub enum FileSystemError {
    /// No backing files were supplied.
    #[error("No backing files given")]
    NoSources,

    /// A backing file does not exist.
    #[error("Backing file not found: {path}")]
    NotFound {
        /// Missing path.
        path: PathBuf,
    },

    /// A backing path exists but is not a regular file.
    #[error("Backing path is not a regular file: {path}")]
    NotARegularFile {
        /// Offending path.
        path: PathBuf,
    },

    /// The sequence base has no usable file name.
    #[error("Invalid sequence base: {path}")]
    InvalidBase {
        /// The base path given.
        path: PathBuf,
    },

    /// No `<stem>.<digits>` parts were found next to the base.
    #[error("No sequence parts found for {base}")]
    NoSequenceParts {
        /// The base path given.
        base: PathBuf,
    },

    /// Two parts share the same numeric index (e.g. `foo.1` and `foo.001`).
    #[error("Sequence index {index} appears more than once: {first} and {second}")]
    DuplicateIndex {
        /// Repeated index.
        index: u64,
        /// First path with the index.
        first: PathBuf,
        /// Second path with the index.
        second: PathBuf,
    },

    /// The sequence skips an index.
    #[error("Sequence gap: expected part {expected}, found {found}")]
    SequenceGap {
        /// Index that should have come next.
        expected: u64,
        /// Index actually found.
        found: u64,
    },

    /// The same backing file is listed more than once, possibly through a link.
    #[error("Source {path} is the same file as {first}")]
    DuplicateSource {
        /// Later occurrence.
        path: PathBuf,
        /// First occurrence.
        first: PathBuf,
    },

    /// Directory walk failed.
    #[error("Failed to scan {path}: {message}")]
    Walk {
        /// Directory being scanned.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Path normalization failed.
    #[error(transparent)]
    Path(#[from] PathError),

    /// Underlying IO error.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path where the error occurred.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}
