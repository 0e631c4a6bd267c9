//! Integration tests for the virtual file over real backing files.
//!
//! Layout used by most tests:
//! - `foo.000` = "aaaa" (virtual bytes 0..4)
//! - `foo.001` = "bbb"  (virtual bytes 4..7)
//!
//! Operations tested:
//! - resolve: offset to segment mapping and its boundaries
//! - read: spanning, short and empty reads
//! - write: in-segment, spanning and clipped writes
//! - namespace: lookup, readdir, getattr, open
//! - concurrency: parallel positioned I/O against shared segments

use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use segcat_common::{ROOT_INODE, VIRTUAL_FILE_INODE};
use segcat_vfs::{
    DirEntry, EntryKind, FilesystemHandlers, MountConfig, SegmentTable, VfsError, VirtualFileIO,
};
use tempfile::TempDir;

/// Helper to create backing files with the given contents.
///
/// # Arguments
/// * `contents` - Content of each part, in order
fn create_parts(contents: &[&[u8]]) -> (TempDir, Vec<PathBuf>) {
    let dir: TempDir = TempDir::new().unwrap();
    let paths: Vec<PathBuf> = contents
        .iter()
        .enumerate()
        .map(|(i, data)| {
            let path: PathBuf = dir.path().join(format!("foo.{:03}", i));
            std::fs::write(&path, data).unwrap();
            path
        })
        .collect();
    (dir, paths)
}

/// Helper to mount-free handlers over "aaaa" + "bbb".
fn create_test_env(file_name: &str) -> (TempDir, Vec<PathBuf>, FilesystemHandlers) {
    let (dir, paths) = create_parts(&[b"aaaa", b"bbb"]);
    let config: MountConfig = MountConfig::new(paths.clone(), file_name, dir.path().join("mnt"));
    let handlers: FilesystemHandlers = FilesystemHandlers::from_config(&config).unwrap();
    (dir, paths, handlers)
}

// =============================================================================
// RESOLVE TESTS
// =============================================================================

mod resolve {
    use super::*;

    #[test]
    fn test_every_offset_resolves_once() {
        let (_dir, paths) = create_parts(&[b"ab", b"", b"cdef", b"g"]);
        let table: SegmentTable = SegmentTable::open(&paths, false).unwrap();
        assert_eq!(table.total_size(), 7);

        for k in 0..table.total_size() {
            let (segment, within) = table.resolve(k).unwrap();
            assert!(segment.start() <= k && k < segment.end());
            assert_eq!(segment.start() + within, k);
        }
    }

    #[test]
    fn test_end_and_beyond_not_found() {
        let (_dir, paths) = create_parts(&[b"aaaa", b"bbb"]);
        let table: SegmentTable = SegmentTable::open(&paths, false).unwrap();

        assert!(table.resolve(7).is_none());
        assert!(table.resolve(8).is_none());
        assert!(table.resolve(1 << 40).is_none());
    }

    #[test]
    fn test_many_segments() {
        let contents: Vec<Vec<u8>> = (0..200u8).map(|i| vec![i; (i % 5) as usize]).collect();
        let refs: Vec<&[u8]> = contents.iter().map(|c| c.as_slice()).collect();
        let (_dir, paths) = create_parts(&refs);

        let io: VirtualFileIO = VirtualFileIO::new(SegmentTable::open(&paths, false).unwrap());
        let expected: Vec<u8> = contents.concat();
        assert_eq!(io.total_size(), expected.len() as u64);
        assert_eq!(io.read(0, expected.len() + 10).unwrap(), expected);
        assert_eq!(io.read(17, 50).unwrap(), expected[17..67].to_vec());
    }
}

// =============================================================================
// READ TESTS
// =============================================================================

mod read {
    use super::*;

    #[test]
    fn test_read_spanning_two_segments() {
        let (_dir, _paths, fs) = create_test_env("foo");
        assert_eq!(fs.read(VIRTUAL_FILE_INODE, 2, 5).unwrap(), b"aabbb");
    }

    #[test]
    fn test_short_read_at_end() {
        let (_dir, _paths, fs) = create_test_env("foo");
        assert_eq!(fs.read(VIRTUAL_FILE_INODE, 6, 10).unwrap(), b"b");
    }

    #[test]
    fn test_read_past_end_is_empty() {
        let (_dir, _paths, fs) = create_test_env("foo");
        assert!(fs.read(VIRTUAL_FILE_INODE, 7, 10).unwrap().is_empty());
        assert!(fs.read(VIRTUAL_FILE_INODE, 1000, 10).unwrap().is_empty());
    }

    #[test]
    fn test_zero_length_read() {
        let (_dir, _paths, fs) = create_test_env("foo");
        assert!(fs.read(VIRTUAL_FILE_INODE, 0, 0).unwrap().is_empty());
        assert!(fs.read(VIRTUAL_FILE_INODE, 3, 0).unwrap().is_empty());
    }

    #[test]
    fn test_reads_see_out_of_band_changes() {
        let (_dir, paths, fs) = create_test_env("foo");
        std::fs::write(&paths[1], b"BBB").unwrap();
        assert_eq!(fs.read(VIRTUAL_FILE_INODE, 0, 7).unwrap(), b"aaaaBBB");
    }
}

// =============================================================================
// WRITE TESTS
// =============================================================================

mod write {
    use super::*;

    #[test]
    fn test_write_then_read_in_segment() {
        let (_dir, paths, fs) = create_test_env("foo");
        assert_eq!(fs.write(VIRTUAL_FILE_INODE, 1, b"XY").unwrap(), 2);
        assert_eq!(fs.read(VIRTUAL_FILE_INODE, 1, 2).unwrap(), b"XY");
        assert_eq!(std::fs::read(&paths[0]).unwrap(), b"aXYa");
    }

    #[test]
    fn test_write_spanning_segments() {
        let (_dir, paths, fs) = create_test_env("foo");
        assert_eq!(fs.write(VIRTUAL_FILE_INODE, 2, b"12345").unwrap(), 5);
        assert_eq!(std::fs::read(&paths[0]).unwrap(), b"aa12");
        assert_eq!(std::fs::read(&paths[1]).unwrap(), b"345");
    }

    #[test]
    fn test_clipped_write() {
        let (_dir, paths, fs) = create_test_env("foo");
        assert_eq!(fs.write(VIRTUAL_FILE_INODE, 6, b"xyz").unwrap(), 1);
        assert_eq!(fs.read(VIRTUAL_FILE_INODE, 6, 1).unwrap(), b"x");
        assert_eq!(std::fs::metadata(&paths[1]).unwrap().len(), 3);
    }

    #[test]
    fn test_aliased_source_refused() {
        let (dir, paths) = create_parts(&[b"aaaa"]);
        let alias: PathBuf = dir.path().join("alias");
        std::os::unix::fs::symlink(&paths[0], &alias).unwrap();

        // Both ranges would map onto one file, so a write at 0 would show up at 4.
        let sources: Vec<PathBuf> = vec![paths[0].clone(), alias];
        let config: MountConfig = MountConfig::new(sources, "foo", dir.path().join("mnt"));
        let err: VfsError = FilesystemHandlers::from_config(&config).unwrap_err();
        assert!(matches!(err, VfsError::DuplicateSource { .. }));
        assert_eq!(err.errno(), libc::EIO);
        assert_eq!(std::fs::read(&paths[0]).unwrap(), b"aaaa");
    }

    #[test]
    fn test_write_past_end_dropped() {
        let (_dir, paths, fs) = create_test_env("foo");
        assert_eq!(fs.write(VIRTUAL_FILE_INODE, 7, b"zzz").unwrap(), 0);
        assert_eq!(std::fs::read(&paths[1]).unwrap(), b"bbb");
    }
}

// =============================================================================
// NAMESPACE TESTS
// =============================================================================

mod namespace {
    use super::*;

    #[test]
    fn test_single_entry_namespace() {
        let (_dir, _paths, fs) = create_test_env("foo");

        let attr = fs.lookup(ROOT_INODE, OsStr::new("foo")).unwrap().unwrap();
        assert_eq!(attr.kind, EntryKind::RegularFile);
        assert_eq!(attr.size, 7);
        assert!(fs.lookup(ROOT_INODE, OsStr::new("bar")).unwrap().is_none());

        let first: Vec<DirEntry> = fs.readdir(ROOT_INODE, 0).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].name, "foo");
        assert_eq!(first[0].ino, VIRTUAL_FILE_INODE);

        let second: Vec<DirEntry> = fs.readdir(ROOT_INODE, first[0].next_offset).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn test_getattr_unknown_inode() {
        let (_dir, _paths, fs) = create_test_env("foo");
        let err: VfsError = fs.getattr(42).unwrap_err();
        assert_eq!(err.errno(), libc::ENOENT);
    }

    #[test]
    fn test_open_returns_virtual_handle() {
        let (_dir, _paths, fs) = create_test_env("foo");
        assert_eq!(fs.open(VIRTUAL_FILE_INODE, libc::O_RDONLY).unwrap(), VIRTUAL_FILE_INODE);
        assert_eq!(
            fs.open(ROOT_INODE, libc::O_RDONLY).unwrap_err().errno(),
            libc::ENOENT
        );
    }

    #[test]
    fn test_empty_virtual_file() {
        let (dir, paths) = create_parts(&[b"", b""]);
        let config: MountConfig = MountConfig::new(paths, "empty", dir.path());
        let fs: FilesystemHandlers = FilesystemHandlers::from_config(&config).unwrap();

        assert_eq!(fs.getattr(VIRTUAL_FILE_INODE).unwrap().size, 0);
        assert!(fs.read(VIRTUAL_FILE_INODE, 0, 16).unwrap().is_empty());
        assert_eq!(fs.write(VIRTUAL_FILE_INODE, 0, b"x").unwrap(), 0);
    }
}

// =============================================================================
// CONCURRENCY TESTS
// =============================================================================

mod concurrency {
    use super::*;

    #[test]
    fn test_parallel_writes_to_shared_segment() {
        let (_dir, paths) = create_parts(&[&[0u8; 4096], &[0u8; 4096]]);
        let config: MountConfig = MountConfig::new(paths, "foo", "/nonexistent");
        let fs: Arc<FilesystemHandlers> = Arc::new(FilesystemHandlers::from_config(&config).unwrap());

        let handles: Vec<thread::JoinHandle<()>> = (0..16u8)
            .map(|t| {
                let fs: Arc<FilesystemHandlers> = fs.clone();
                thread::spawn(move || {
                    let offset: i64 = i64::from(t) * 512;
                    let block: Vec<u8> = vec![t + 1; 512];
                    for _ in 0..20 {
                        assert_eq!(fs.write(VIRTUAL_FILE_INODE, offset, &block).unwrap(), 512);
                        assert_eq!(fs.read(VIRTUAL_FILE_INODE, offset, 512).unwrap(), block);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let content: Vec<u8> = fs.read(VIRTUAL_FILE_INODE, 0, 8192).unwrap();
        for (t, chunk) in content.chunks(512).enumerate() {
            assert!(chunk.iter().all(|&b| b == t as u8 + 1), "block {}", t);
        }
    }
}
