//! Shared constants used across segcat crates.

/// Inode number of the mount root directory (FUSE reserves 1 for the root).
pub const ROOT_INODE: u64 = 1;

/// Inode number of the single virtual file under the root.
pub const VIRTUAL_FILE_INODE: u64 = ROOT_INODE + 1;

/// Permission bits reported for the root directory.
pub const ROOT_DIR_MODE: u16 = 0o755;

/// Default permission bits for the virtual file.
pub const DEFAULT_FILE_MODE: u16 = 0o666;

/// Highest permission value accepted for the virtual file (owner/group/other).
pub const MAX_FILE_MODE: u16 = 0o777;

/// Fixed timestamp reported for atime/mtime/ctime, in nanoseconds since the epoch.
///
/// Backing file timestamps are not surfaced through the mount.
pub const FIXED_TIMESTAMP_NANOS: u64 = 1_438_467_123_985_654_000;

/// Block size used when reporting `st_blocks` and `st_blksize`.
pub const BLOCK_SIZE: u32 = 512;

/// Default FUSE filesystem name shown in the mount table.
pub const DEFAULT_FS_NAME: &str = "segcat";
