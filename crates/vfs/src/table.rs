//! Ordered segment table and global-offset resolution.
//!
//! The table is built once at mount time and never changes afterwards, so
//! lookups need no locking. Segments are contiguous: `segments[i].end()`
//! equals `segments[i + 1].start()` and the first segment starts at 0.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::segment::BackingSegment;
use crate::VfsError;

/// Ordered, gap-free collection of backing segments.
#[derive(Debug)]
pub struct SegmentTable {
    segments: Vec<BackingSegment>,
    total_size: u64,
}

impl SegmentTable {
    /// Open backing files in order and lay them end to end.
    ///
    /// # Arguments
    /// * `paths` - Backing files in virtual-file order
    /// * `writable` - Open backing files for read/write
    ///
    /// # Errors
    /// Returns error if any file cannot be opened or the same file is
    /// listed twice.
    pub fn open(paths: &[PathBuf], writable: bool) -> Result<Self, VfsError> {
        let mut segments: Vec<BackingSegment> = Vec::with_capacity(paths.len());
        let mut start: u64 = 0;

        for path in paths {
            let segment: BackingSegment = BackingSegment::open(path, start, writable)?;
            tracing::debug!(
                path = %path.display(),
                start = segment.start(),
                size = segment.size(),
                "Opened backing segment"
            );
            start = segment.end();
            segments.push(segment);
        }

        Self::from_segments(segments)
    }

    /// Build a table from already opened segments.
    ///
    /// # Arguments
    /// * `segments` - Segments in ascending `start` order
    ///
    /// # Errors
    /// Returns `VfsError::NonContiguous` if the first segment does not start
    /// at 0 or any segment does not start where the previous one ended, and
    /// `VfsError::DuplicateSource` if two segments are the same file on disk
    /// (including through symlinks or hard links).
    pub fn from_segments(segments: Vec<BackingSegment>) -> Result<Self, VfsError> {
        let mut seen: HashMap<(u64, u64), &Path> = HashMap::with_capacity(segments.len());
        let mut expected: u64 = 0;
        for segment in &segments {
            if let Some(first) = seen.insert(segment.file_id(), segment.path()) {
                return Err(VfsError::DuplicateSource {
                    path: segment.path().to_path_buf(),
                    first: first.to_path_buf(),
                });
            }

            if segment.start() != expected {
                return Err(VfsError::NonContiguous {
                    path: segment.path().to_path_buf(),
                    expected,
                    actual: segment.start(),
                });
            }
            expected = segment.end();
        }

        Ok(Self {
            segments,
            total_size: expected,
        })
    }

    /// Find the segment holding a global offset.
    ///
    /// Binary search over segment ends; zero-length segments never match.
    ///
    /// # Arguments
    /// * `offset` - Global offset
    ///
    /// # Returns
    /// The owning segment and the intra-segment offset, or `None` at or past
    /// the end of the virtual file.
    pub fn resolve(&self, offset: u64) -> Option<(&BackingSegment, u64)> {
        let idx: usize = self
            .segments
            .partition_point(|s: &BackingSegment| s.end() <= offset);
        let segment: &BackingSegment = self.segments.get(idx)?;

        if !segment.contains(offset) {
            return None;
        }
        Some((segment, offset - segment.start()))
    }

    /// Size of the virtual file.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the table has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterate segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &BackingSegment> {
        self.segments.iter()
    }

    /// Check that no backing file changed length since mount.
    ///
    /// # Errors
    /// Returns `VfsError::SizeChanged` for the first segment whose current
    /// length differs from its mount-time size.
    pub fn verify_sizes(&self) -> Result<(), VfsError> {
        for segment in &self.segments {
            let actual: u64 = segment.current_len()?;
            if actual != segment.size() {
                return Err(VfsError::SizeChanged {
                    path: segment.path().to_path_buf(),
                    expected: segment.size(),
                    actual,
                });
            }
        }
        Ok(())
    }
}
