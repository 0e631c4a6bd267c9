//! Error types for the VFS crate.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur during VFS operations.
#[derive(Debug)]
pub enum VfsError {
    /// Inode not found.
    InodeNotFound(u64),

    /// Not a directory.
    NotADirectory(u64),

    /// File handle does not refer to the virtual file.
    InvalidHandle(u64),

    /// Mount configuration is unusable.
    InvalidConfig(String),

    /// A backing file could not be opened.
    SegmentOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Read, write or sync against a backing file failed.
    SegmentIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A segment does not start where the previous one ended.
    NonContiguous {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// The same backing file appears more than once.
    DuplicateSource {
        path: PathBuf,
        first: PathBuf,
    },

    /// A backing file's length differs from its size at mount time.
    SizeChanged {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Mount operation failed.
    MountFailed(String),
}

impl VfsError {
    /// Errno reported to the kernel for this error.
    pub fn errno(&self) -> libc::c_int {
        match self {
            VfsError::InodeNotFound(_) => libc::ENOENT,
            VfsError::NotADirectory(_) => libc::ENOTDIR,
            VfsError::InvalidHandle(_) => libc::EBADF,
            VfsError::InvalidConfig(_)
            | VfsError::SegmentOpen { .. }
            | VfsError::SegmentIo { .. }
            | VfsError::NonContiguous { .. }
            | VfsError::DuplicateSource { .. }
            | VfsError::SizeChanged { .. }
            | VfsError::MountFailed(_) => libc::EIO,
        }
    }
}

impl fmt::Display for VfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VfsError::InodeNotFound(id) => write!(f, "Inode not found: {}", id),
            VfsError::NotADirectory(id) => write!(f, "Not a directory: {}", id),
            VfsError::InvalidHandle(fh) => write!(f, "Invalid file handle: {}", fh),
            VfsError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            VfsError::SegmentOpen { path, source } => {
                write!(f, "Failed to open backing file {}: {}", path.display(), source)
            }
            VfsError::SegmentIo { path, source } => {
                write!(f, "I/O error on backing file {}: {}", path.display(), source)
            }
            VfsError::NonContiguous {
                path,
                expected,
                actual,
            } => write!(
                f,
                "Backing file {} starts at {}, expected {}",
                path.display(),
                actual,
                expected
            ),
            VfsError::DuplicateSource { path, first } => write!(
                f,
                "Backing file {} is the same file as {}",
                path.display(),
                first.display()
            ),
            VfsError::SizeChanged {
                path,
                expected,
                actual,
            } => write!(
                f,
                "Backing file {} changed size: mounted with {} bytes, now {}",
                path.display(),
                expected,
                actual
            ),
            VfsError::MountFailed(msg) => write!(f, "Mount failed: {}", msg),
        }
    }
}

impl std::error::Error for VfsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VfsError::SegmentOpen { source, .. } | VfsError::SegmentIo { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}
