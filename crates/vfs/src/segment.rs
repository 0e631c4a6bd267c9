//! A single backing file and its byte range in the virtual file.

use std::fs::{File, Metadata, OpenOptions};
use std::os::unix::fs::{FileExt, MetadataExt};
use std::path::{Path, PathBuf};

use crate::VfsError;

/// One real file contributing `[start, start + size)` to the virtual file.
///
/// All I/O is positioned (`pread`/`pwrite`), so the handle carries no shared
/// cursor and concurrent requests against the same segment do not interfere.
#[derive(Debug)]
pub struct BackingSegment {
    /// Path the file was opened from.
    path: PathBuf,
    /// Virtual offset of the first byte (inclusive).
    start: u64,
    /// Length of the file at mount time.
    size: u64,
    /// Device and inode of the opened file.
    file_id: (u64, u64),
    /// Open handle to the backing file.
    file: File,
}

impl BackingSegment {
    /// Open a backing file and place it at `start` in the virtual file.
    ///
    /// # Arguments
    /// * `path` - Existing regular file
    /// * `start` - Virtual offset of the file's first byte
    /// * `writable` - Open for read/write rather than read-only
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or is not a regular file.
    pub fn open(path: &Path, start: u64, writable: bool) -> Result<Self, VfsError> {
        let file: File = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(path)
            .map_err(|e| VfsError::SegmentOpen {
                path: path.to_path_buf(),
                source: e,
            })?;

        let metadata: Metadata = file.metadata().map_err(|e| VfsError::SegmentOpen {
            path: path.to_path_buf(),
            source: e,
        })?;

        if !metadata.is_file() {
            return Err(VfsError::InvalidConfig(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            start,
            size: metadata.len(),
            file_id: (metadata.dev(), metadata.ino()),
            file,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Device and inode of the backing file.
    ///
    /// Two segments with the same id share bytes on disk, whatever paths
    /// they were opened through.
    pub fn file_id(&self) -> (u64, u64) {
        self.file_id
    }

    /// Virtual offset of the first byte.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Size fixed at mount time.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Virtual offset one past the last byte.
    pub fn end(&self) -> u64 {
        self.start + self.size
    }

    /// Whether a virtual offset falls inside this segment.
    ///
    /// # Arguments
    /// * `offset` - Global offset
    pub fn contains(&self, offset: u64) -> bool {
        self.start <= offset && offset < self.end()
    }

    /// Read into `buf` starting at an intra-segment offset.
    ///
    /// Never reads past the end of the segment: at most
    /// `min(buf.len(), size - offset)` bytes are transferred.
    ///
    /// # Arguments
    /// * `offset` - Offset relative to the segment start
    /// * `buf` - Destination buffer
    ///
    /// # Returns
    /// Number of bytes read.
    ///
    /// # Errors
    /// Returns error if the backing file cannot supply the bytes, including
    /// when it has shrunk since mount.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize, VfsError> {
        let count: usize = self.clip(offset, buf.len());
        if count == 0 {
            return Ok(0);
        }

        self.file
            .read_exact_at(&mut buf[..count], offset)
            .map_err(|e| self.io_error(e))?;
        Ok(count)
    }

    /// Write from `data` starting at an intra-segment offset.
    ///
    /// Never writes past the end of the segment and never extends the file.
    ///
    /// # Arguments
    /// * `offset` - Offset relative to the segment start
    /// * `data` - Bytes to write
    ///
    /// # Returns
    /// Number of bytes written.
    pub fn write_at(&self, offset: u64, data: &[u8]) -> Result<usize, VfsError> {
        let count: usize = self.clip(offset, data.len());
        if count == 0 {
            return Ok(0);
        }

        self.file
            .write_all_at(&data[..count], offset)
            .map_err(|e| self.io_error(e))?;
        Ok(count)
    }

    /// Flush file content and metadata to disk.
    pub fn sync(&self) -> Result<(), VfsError> {
        self.file.sync_all().map_err(|e| self.io_error(e))
    }

    /// Current on-disk length of the open handle.
    pub fn current_len(&self) -> Result<u64, VfsError> {
        self.file
            .metadata()
            .map(|m: Metadata| m.len())
            .map_err(|e| self.io_error(e))
    }

    /// Bytes transferable from `offset` without leaving the segment.
    fn clip(&self, offset: u64, requested: usize) -> usize {
        let remaining: u64 = self.size.saturating_sub(offset);
        remaining.min(requested as u64) as usize
    }

    fn io_error(&self, source: std::io::Error) -> VfsError {
        VfsError::SegmentIo {
            path: self.path.clone(),
            source,
        }
    }
}
