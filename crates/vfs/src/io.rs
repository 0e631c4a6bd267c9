//! Whole-request reads and writes against the virtual file.
//!
//! A request may span several segments. Each step resolves the current
//! global offset, transfers as much as the owning segment allows, and moves
//! on. Requests that run past the end of the virtual file are clipped.

use crate::segment::BackingSegment;
use crate::table::SegmentTable;
use crate::VfsError;

/// Routes reads and writes on the virtual file to backing segments.
#[derive(Debug)]
pub struct VirtualFileIO {
    table: SegmentTable,
}

impl VirtualFileIO {
    /// Create the router over a mounted segment table.
    ///
    /// # Arguments
    /// * `table` - Segment table built at mount time
    pub fn new(table: SegmentTable) -> Self {
        Self { table }
    }

    /// The underlying segment table.
    pub fn table(&self) -> &SegmentTable {
        &self.table
    }

    /// Size of the virtual file.
    pub fn total_size(&self) -> u64 {
        self.table.total_size()
    }

    /// Read up to `length` bytes starting at a global offset.
    ///
    /// A read at or past the end of the virtual file, or of zero length,
    /// returns an empty buffer. A read crossing the end returns only the
    /// bytes that exist.
    ///
    /// # Arguments
    /// * `offset` - Global offset of the first byte
    /// * `length` - Maximum number of bytes to return
    ///
    /// # Returns
    /// Virtual file content over `[offset, offset + returned_len)`.
    ///
    /// # Errors
    /// Returns error if a backing file read fails.
    pub fn read(&self, offset: u64, length: usize) -> Result<Vec<u8>, VfsError> {
        let available: u64 = self.total_size().saturating_sub(offset);
        let wanted: usize = available.min(length as u64) as usize;
        let mut buf: Vec<u8> = vec![0u8; wanted];
        let mut filled: usize = 0;

        while filled < wanted {
            let pos: u64 = offset + filled as u64;
            let Some((segment, within)) = self.table.resolve(pos) else {
                break;
            };
            let n: usize = segment.read_at(within, &mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        buf.truncate(filled);
        Ok(buf)
    }

    /// Write `data` starting at a global offset.
    ///
    /// The virtual file never grows: bytes that would land at or past its
    /// end are dropped and not counted.
    ///
    /// # Arguments
    /// * `offset` - Global offset of the first byte
    /// * `data` - Bytes to write
    ///
    /// # Returns
    /// Number of bytes persisted to backing files.
    ///
    /// # Errors
    /// Returns error if a backing file write fails. Bytes written to earlier
    /// segments of the same request stay written.
    pub fn write(&self, offset: u64, data: &[u8]) -> Result<usize, VfsError> {
        let available: u64 = self.total_size().saturating_sub(offset);
        let wanted: usize = available.min(data.len() as u64) as usize;
        let mut written: usize = 0;

        while written < wanted {
            let pos: u64 = offset + written as u64;
            let Some((segment, within)) = self.table.resolve(pos) else {
                break;
            };
            let n: usize = segment.write_at(within, &data[written..wanted])?;
            if n == 0 {
                break;
            }
            written += n;
        }

        if written < data.len() {
            tracing::warn!(
                offset,
                requested = data.len(),
                written,
                total_size = self.total_size(),
                "Write clipped at end of virtual file"
            );
        }
        Ok(written)
    }

    /// Flush every backing file to disk.
    pub fn sync(&self) -> Result<(), VfsError> {
        self.table.segments().try_for_each(BackingSegment::sync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Two segments: "aaaa" then "bbb".
    fn setup() -> (TempDir, Vec<PathBuf>, VirtualFileIO) {
        let dir: TempDir = TempDir::new().unwrap();
        let a: PathBuf = dir.path().join("foo.000");
        let b: PathBuf = dir.path().join("foo.001");
        std::fs::write(&a, b"aaaa").unwrap();
        std::fs::write(&b, b"bbb").unwrap();

        let paths: Vec<PathBuf> = vec![a, b];
        let io: VirtualFileIO = VirtualFileIO::new(SegmentTable::open(&paths, true).unwrap());
        (dir, paths, io)
    }

    #[test]
    fn test_read_spanning() {
        let (_dir, _paths, io) = setup();
        assert_eq!(io.read(2, 5).unwrap(), b"aabbb");
        assert_eq!(io.read(0, 7).unwrap(), b"aaaabbb");
    }

    #[test]
    fn test_short_read() {
        let (_dir, _paths, io) = setup();
        assert_eq!(io.read(6, 10).unwrap(), b"b");
        assert!(io.read(7, 10).unwrap().is_empty());
        assert!(io.read(100, 10).unwrap().is_empty());
    }

    #[test]
    fn test_empty_read() {
        let (_dir, _paths, io) = setup();
        assert!(io.read(0, 0).unwrap().is_empty());
        assert!(io.read(5, 0).unwrap().is_empty());
    }

    #[test]
    fn test_clipped_write() {
        let (_dir, paths, io) = setup();
        assert_eq!(io.write(6, b"xyz").unwrap(), 1);
        assert_eq!(io.read(6, 1).unwrap(), b"x");
        assert_eq!(std::fs::read(&paths[1]).unwrap(), b"bbx");
    }

    #[test]
    fn test_write_past_end() {
        let (_dir, paths, io) = setup();
        assert_eq!(io.write(7, b"zz").unwrap(), 0);
        assert_eq!(std::fs::metadata(&paths[1]).unwrap().len(), 3);
    }

    #[test]
    fn test_write_spanning() {
        let (_dir, paths, io) = setup();
        assert_eq!(io.write(3, b"XYZ").unwrap(), 3);
        assert_eq!(std::fs::read(&paths[0]).unwrap(), b"aaaX");
        assert_eq!(std::fs::read(&paths[1]).unwrap(), b"YZb");
        assert_eq!(io.read(0, 7).unwrap(), b"aaaXYZb");
    }

    #[test]
    fn test_sync() {
        let (_dir, _paths, io) = setup();
        io.write(0, b"q").unwrap();
        assert!(io.sync().is_ok());
    }
}
