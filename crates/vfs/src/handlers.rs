//! Transport-independent filesystem callbacks.
//!
//! The namespace is fixed: a root directory holding exactly one regular
//! file. Every callback answers in terms of that namespace and delegates
//! file content to [`VirtualFileIO`]. The FUSE adapter in `fuse` only
//! converts these results into kernel replies.

use std::ffi::OsStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use segcat_common::{
    BLOCK_SIZE, FIXED_TIMESTAMP_NANOS, ROOT_DIR_MODE, ROOT_INODE, VIRTUAL_FILE_INODE,
};

use crate::io::VirtualFileIO;
use crate::options::MountConfig;
use crate::table::SegmentTable;
use crate::VfsError;

/// Type of a namespace entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// The mount root.
    Directory,
    /// The virtual file.
    RegularFile,
}

/// Attributes of a namespace entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryAttr {
    /// Inode number.
    pub ino: u64,
    /// Entry type.
    pub kind: EntryKind,
    /// Permission bits.
    pub perm: u16,
    /// Size in bytes.
    pub size: u64,
    /// Number of 512-byte blocks.
    pub blocks: u64,
    /// Hard link count.
    pub nlink: u32,
    /// Owner user id.
    pub uid: u32,
    /// Owner group id.
    pub gid: u32,
    /// Access, change and modification time.
    pub time: SystemTime,
}

/// One directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Inode number of the entry.
    pub ino: u64,
    /// Position to resume the listing after this entry.
    pub next_offset: i64,
    /// Entry type.
    pub kind: EntryKind,
    /// Entry name.
    pub name: String,
}

/// Callback surface for the single-file namespace.
#[derive(Debug)]
pub struct FilesystemHandlers {
    io: VirtualFileIO,
    file_name: String,
    mode: u16,
    uid: u32,
    gid: u32,
}

impl FilesystemHandlers {
    /// Create handlers over an existing router.
    ///
    /// Ownership is reported as the current process's user and group.
    ///
    /// # Arguments
    /// * `io` - Router for the virtual file's content
    /// * `file_name` - Name of the virtual file under the root
    /// * `mode` - Permission bits of the virtual file
    pub fn new(io: VirtualFileIO, file_name: impl Into<String>, mode: u16) -> Self {
        Self {
            io,
            file_name: file_name.into(),
            mode,
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
        }
    }

    /// Validate a mount configuration and open its backing files.
    ///
    /// # Arguments
    /// * `config` - Mount-time configuration
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or a backing file
    /// cannot be opened.
    pub fn from_config(config: &MountConfig) -> Result<Self, VfsError> {
        config.validate()?;

        let table: SegmentTable = SegmentTable::open(&config.sources, !config.mount.read_only)?;
        tracing::info!(
            file_name = %config.file_name,
            segments = table.len(),
            total_size = table.total_size(),
            "Opened backing files"
        );

        Ok(Self::new(
            VirtualFileIO::new(table),
            config.file_name.clone(),
            config.mode,
        ))
    }

    /// The content router.
    pub fn io(&self) -> &VirtualFileIO {
        &self.io
    }

    /// Name of the virtual file.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Resolve a name under a directory.
    ///
    /// # Arguments
    /// * `parent` - Directory inode
    /// * `name` - Entry name
    ///
    /// # Returns
    /// The virtual file's attributes if `name` matches, `None` otherwise.
    ///
    /// # Errors
    /// Returns error if `parent` is not the root directory.
    pub fn lookup(&self, parent: u64, name: &OsStr) -> Result<Option<EntryAttr>, VfsError> {
        self.require_root(parent)?;

        if name == OsStr::new(&self.file_name) {
            Ok(Some(self.file_attr()))
        } else {
            Ok(None)
        }
    }

    /// List the root directory from a resume position.
    ///
    /// Position 0 yields the virtual file; any later position yields nothing.
    ///
    /// # Arguments
    /// * `dir` - Directory inode
    /// * `offset` - Resume position from a previous listing
    ///
    /// # Errors
    /// Returns error if `dir` is not the root directory.
    pub fn readdir(&self, dir: u64, offset: i64) -> Result<Vec<DirEntry>, VfsError> {
        self.require_root(dir)?;

        if offset != 0 {
            return Ok(Vec::new());
        }

        Ok(vec![DirEntry {
            ino: VIRTUAL_FILE_INODE,
            next_offset: 1,
            kind: EntryKind::RegularFile,
            name: self.file_name.clone(),
        }])
    }

    /// Attributes of the root directory or the virtual file.
    ///
    /// # Arguments
    /// * `ino` - Inode number
    ///
    /// # Errors
    /// Returns `VfsError::InodeNotFound` for any other inode.
    pub fn getattr(&self, ino: u64) -> Result<EntryAttr, VfsError> {
        match ino {
            ROOT_INODE => Ok(self.root_attr()),
            VIRTUAL_FILE_INODE => Ok(self.file_attr()),
            other => Err(VfsError::InodeNotFound(other)),
        }
    }

    /// Open the virtual file.
    ///
    /// Access flags are not checked here; the kernel enforces the reported
    /// mode when mounted with `default_permissions`. Backing file sizes are
    /// revalidated on every open.
    ///
    /// # Arguments
    /// * `ino` - Inode number
    /// * `flags` - Open flags from the caller
    ///
    /// # Returns
    /// File handle, equal to the virtual file inode.
    ///
    /// # Errors
    /// Returns `VfsError::InodeNotFound` for any inode other than the virtual
    /// file, or `VfsError::SizeChanged` if a backing file was resized.
    pub fn open(&self, ino: u64, flags: i32) -> Result<u64, VfsError> {
        if ino != VIRTUAL_FILE_INODE {
            return Err(VfsError::InodeNotFound(ino));
        }

        self.io.table().verify_sizes()?;
        tracing::debug!(ino, flags, "Opened virtual file");
        Ok(VIRTUAL_FILE_INODE)
    }

    /// Read from the virtual file.
    ///
    /// # Arguments
    /// * `fh` - Handle returned by [`open`](Self::open)
    /// * `offset` - Global offset; negative offsets read nothing
    /// * `length` - Maximum bytes to return
    pub fn read(&self, fh: u64, offset: i64, length: usize) -> Result<Vec<u8>, VfsError> {
        self.require_handle(fh)?;
        match u64::try_from(offset) {
            Ok(offset) => self.io.read(offset, length),
            Err(_) => Ok(Vec::new()),
        }
    }

    /// Write to the virtual file.
    ///
    /// # Arguments
    /// * `fh` - Handle returned by [`open`](Self::open)
    /// * `offset` - Global offset; negative offsets write nothing
    /// * `data` - Bytes to write
    ///
    /// # Returns
    /// Number of bytes persisted.
    pub fn write(&self, fh: u64, offset: i64, data: &[u8]) -> Result<usize, VfsError> {
        self.require_handle(fh)?;
        match u64::try_from(offset) {
            Ok(offset) => self.io.write(offset, data),
            Err(_) => Ok(0),
        }
    }

    /// Flush all backing files to disk.
    ///
    /// # Arguments
    /// * `fh` - Handle returned by [`open`](Self::open)
    pub fn fsync(&self, fh: u64) -> Result<(), VfsError> {
        self.require_handle(fh)?;
        self.io.sync()
    }

    fn require_root(&self, ino: u64) -> Result<(), VfsError> {
        match ino {
            ROOT_INODE => Ok(()),
            VIRTUAL_FILE_INODE => Err(VfsError::NotADirectory(ino)),
            other => Err(VfsError::InodeNotFound(other)),
        }
    }

    fn require_handle(&self, fh: u64) -> Result<(), VfsError> {
        if fh == VIRTUAL_FILE_INODE {
            Ok(())
        } else {
            Err(VfsError::InvalidHandle(fh))
        }
    }

    fn root_attr(&self) -> EntryAttr {
        EntryAttr {
            ino: ROOT_INODE,
            kind: EntryKind::Directory,
            perm: ROOT_DIR_MODE,
            size: 0,
            blocks: 0,
            nlink: 2,
            uid: self.uid,
            gid: self.gid,
            time: fixed_timestamp(),
        }
    }

    fn file_attr(&self) -> EntryAttr {
        let size: u64 = self.io.total_size();
        EntryAttr {
            ino: VIRTUAL_FILE_INODE,
            kind: EntryKind::RegularFile,
            perm: self.mode,
            size,
            blocks: size.div_ceil(u64::from(BLOCK_SIZE)),
            nlink: 1,
            uid: self.uid,
            gid: self.gid,
            time: fixed_timestamp(),
        }
    }
}

/// The timestamp reported for every entry.
pub fn fixed_timestamp() -> SystemTime {
    UNIX_EPOCH + Duration::from_nanos(FIXED_TIMESTAMP_NANOS)
}
