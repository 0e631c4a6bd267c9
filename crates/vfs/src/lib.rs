//! Exposes ordered backing files as one virtual file over FUSE.
//!
//! Byte `k` of the virtual file resolves to exactly one backing file and an
//! offset within it. Nothing is copied or cached: reads and writes go
//! straight to the backing files with positioned I/O.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: FUSE Interface (fuser::Filesystem impl, feature "fuse")
//! Layer 2: FilesystemHandlers (lookup, readdir, getattr, open, read, write)
//! Layer 1: VirtualFileIO -> SegmentTable -> BackingSegment
//! ```
//!
//! # Example
//!
//! ```ignore
//! use segcat_vfs::MountConfig;
//!
//! let config = MountConfig::new(vec!["foo.000".into(), "foo.001".into()], "foo", "/mnt/foo");
//! segcat_vfs::mount(&config)?;
//! ```

pub mod error;
pub mod fuse;
pub mod handlers;
pub mod io;
pub mod options;
pub mod segment;
pub mod table;

pub use error::VfsError;
pub use handlers::{fixed_timestamp, DirEntry, EntryAttr, EntryKind, FilesystemHandlers};
pub use io::VirtualFileIO;
pub use options::{KernelCacheOptions, MountConfig, MountOptions};
pub use segment::BackingSegment;
pub use table::SegmentTable;

#[cfg(feature = "fuse")]
pub use fuse::{mount, mount_options, spawn_mount, SegcatFs};
