//! FUSE adapter for the single-file namespace.
//!
//! Converts [`FilesystemHandlers`] results into `fuser` replies and builds
//! the mount option list from [`MountOptions`].

#[cfg(feature = "fuse")]
mod impl_fuse {
    use std::ffi::OsStr;
    use std::path::Path;
    use std::time::{Duration, UNIX_EPOCH};

    use fuser::{
        FileAttr, FileType, Filesystem, MountOption, ReplyAttr, ReplyData, ReplyDirectory,
        ReplyEmpty, ReplyEntry, ReplyOpen, ReplyWrite, Request,
    };
    use segcat_common::BLOCK_SIZE;

    use crate::handlers::{EntryAttr, EntryKind, FilesystemHandlers};
    use crate::options::{KernelCacheOptions, MountConfig, MountOptions};
    use crate::VfsError;

    /// `fuser::Filesystem` implementation over [`FilesystemHandlers`].
    pub struct SegcatFs {
        /// Namespace and content callbacks.
        handlers: FilesystemHandlers,
        /// Kernel cache settings.
        cache: KernelCacheOptions,
        /// Log every request at debug level.
        debug: bool,
    }

    impl SegcatFs {
        /// Wrap handlers for mounting.
        ///
        /// # Arguments
        /// * `handlers` - Callback surface to serve
        /// * `cache` - Kernel cache configuration
        /// * `debug` - Log every request
        pub fn new(handlers: FilesystemHandlers, cache: KernelCacheOptions, debug: bool) -> Self {
            Self {
                handlers,
                cache,
                debug,
            }
        }

        /// Validate a configuration, open its backing files and wrap them.
        ///
        /// # Arguments
        /// * `config` - Mount-time configuration
        pub fn from_config(config: &MountConfig) -> Result<Self, VfsError> {
            let handlers: FilesystemHandlers = FilesystemHandlers::from_config(config)?;
            Ok(Self::new(
                handlers,
                config.kernel_cache.clone(),
                config.mount.debug,
            ))
        }

        fn attr_ttl(&self) -> Duration {
            Duration::from_secs(self.cache.attr_timeout_secs)
        }

        fn entry_ttl(&self) -> Duration {
            Duration::from_secs(self.cache.entry_timeout_secs)
        }

        fn open_flags(&self) -> u32 {
            if self.cache.keep_page_cache {
                fuser::consts::FOPEN_KEEP_CACHE
            } else {
                0
            }
        }
    }

    /// Convert handler attributes to FUSE attributes.
    fn to_file_attr(attr: &EntryAttr) -> FileAttr {
        FileAttr {
            ino: attr.ino,
            size: attr.size,
            blocks: attr.blocks,
            atime: attr.time,
            mtime: attr.time,
            ctime: attr.time,
            crtime: UNIX_EPOCH,
            kind: to_file_type(attr.kind),
            perm: attr.perm,
            nlink: attr.nlink,
            uid: attr.uid,
            gid: attr.gid,
            rdev: 0,
            blksize: BLOCK_SIZE,
            flags: 0,
        }
    }

    fn to_file_type(kind: EntryKind) -> FileType {
        match kind {
            EntryKind::Directory => FileType::Directory,
            EntryKind::RegularFile => FileType::RegularFile,
        }
    }

    impl Filesystem for SegcatFs {
        fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
            if self.debug {
                tracing::debug!(parent, name = ?name, "lookup");
            }

            match self.handlers.lookup(parent, name) {
                Ok(Some(attr)) => reply.entry(&self.entry_ttl(), &to_file_attr(&attr), 0),
                Ok(None) => reply.error(libc::ENOENT),
                Err(e) => reply.error(e.errno()),
            }
        }

        fn getattr(&mut self, _req: &Request, ino: u64, reply: ReplyAttr) {
            if self.debug {
                tracing::debug!(ino, "getattr");
            }

            match self.handlers.getattr(ino) {
                Ok(attr) => reply.attr(&self.attr_ttl(), &to_file_attr(&attr)),
                Err(e) => reply.error(e.errno()),
            }
        }

        fn readdir(
            &mut self,
            _req: &Request,
            ino: u64,
            _fh: u64,
            offset: i64,
            mut reply: ReplyDirectory,
        ) {
            if self.debug {
                tracing::debug!(ino, offset, "readdir");
            }

            match self.handlers.readdir(ino, offset) {
                Ok(entries) => {
                    for entry in entries {
                        let kind: FileType = to_file_type(entry.kind);
                        if reply.add(entry.ino, entry.next_offset, kind, &entry.name) {
                            break;
                        }
                    }
                    reply.ok();
                }
                Err(e) => reply.error(e.errno()),
            }
        }

        fn open(&mut self, _req: &Request, ino: u64, flags: i32, reply: ReplyOpen) {
            if self.debug {
                tracing::debug!(ino, flags, "open");
            }

            match self.handlers.open(ino, flags) {
                Ok(fh) => reply.opened(fh, self.open_flags()),
                Err(e) => {
                    if !matches!(e, VfsError::InodeNotFound(_)) {
                        tracing::error!("Open failed for inode {}: {}", ino, e);
                    }
                    reply.error(e.errno());
                }
            }
        }

        fn read(
            &mut self,
            _req: &Request,
            _ino: u64,
            fh: u64,
            offset: i64,
            size: u32,
            _flags: i32,
            _lock: Option<u64>,
            reply: ReplyData,
        ) {
            if self.debug {
                tracing::debug!(fh, offset, size, "read");
            }

            match self.handlers.read(fh, offset, size as usize) {
                Ok(data) => reply.data(&data),
                Err(e) => {
                    tracing::error!("Read failed at offset {}: {}", offset, e);
                    reply.error(e.errno());
                }
            }
        }

        fn write(
            &mut self,
            _req: &Request,
            _ino: u64,
            fh: u64,
            offset: i64,
            data: &[u8],
            _write_flags: u32,
            _flags: i32,
            _lock: Option<u64>,
            reply: ReplyWrite,
        ) {
            if self.debug {
                tracing::debug!(fh, offset, len = data.len(), "write");
            }

            match self.handlers.write(fh, offset, data) {
                Ok(written) => reply.written(written as u32),
                Err(e) => {
                    tracing::error!("Write failed at offset {}: {}", offset, e);
                    reply.error(e.errno());
                }
            }
        }

        fn flush(
            &mut self,
            _req: &Request,
            _ino: u64,
            _fh: u64,
            _lock_owner: u64,
            reply: ReplyEmpty,
        ) {
            reply.ok();
        }

        fn fsync(
            &mut self,
            _req: &Request,
            _ino: u64,
            fh: u64,
            _datasync: bool,
            reply: ReplyEmpty,
        ) {
            match self.handlers.fsync(fh) {
                Ok(()) => reply.ok(),
                Err(e) => {
                    tracing::error!("fsync failed: {}", e);
                    reply.error(e.errno());
                }
            }
        }

        fn release(
            &mut self,
            _req: &Request,
            _ino: u64,
            _fh: u64,
            _flags: i32,
            _lock: Option<u64>,
            _flush: bool,
            reply: ReplyEmpty,
        ) {
            reply.ok();
        }

        fn destroy(&mut self) {
            if let Err(e) = self.handlers.io().sync() {
                tracing::error!("Final sync failed: {}", e);
            }
            tracing::info!(file_name = %self.handlers.file_name(), "Unmounted");
        }
    }

    /// Build the `fuser` option list for a mount.
    ///
    /// # Arguments
    /// * `options` - Mount options
    pub fn mount_options(options: &MountOptions) -> Vec<MountOption> {
        let mut opts: Vec<MountOption> = vec![MountOption::FSName(options.fs_name.clone())];
        if options.read_only {
            opts.push(MountOption::RO);
        } else {
            opts.push(MountOption::RW);
        }
        if options.allow_other {
            opts.push(MountOption::AllowOther);
        }
        if options.auto_unmount {
            opts.push(MountOption::AutoUnmount);
        }
        if options.default_permissions {
            opts.push(MountOption::DefaultPermissions);
        }
        opts
    }

    /// Warn when fuser will add `allow_other` the user did not ask for.
    fn warn_implicit_allow_other(options: &MountOptions) {
        if options.effective_allow_other() && !options.allow_other && unsafe { libc::getuid() } != 0 {
            tracing::warn!(
                "auto_unmount implies allow_other; non-root mounts need user_allow_other \
                 in /etc/fuse.conf (or pass --no-auto-unmount)"
            );
        }
    }

    /// Mount and serve until unmounted.
    ///
    /// # Arguments
    /// * `config` - Mount-time configuration
    pub fn mount(config: &MountConfig) -> Result<(), VfsError> {
        let fs: SegcatFs = SegcatFs::from_config(config)?;
        let mountpoint: &Path = &config.mountpoint;

        tracing::info!(mountpoint = %mountpoint.display(), "Mounting");
        warn_implicit_allow_other(&config.mount);
        fuser::mount2(fs, mountpoint, &mount_options(&config.mount))
            .map_err(|e| VfsError::MountFailed(e.to_string()))
    }

    /// Mount in the background.
    ///
    /// # Arguments
    /// * `config` - Mount-time configuration
    ///
    /// # Returns
    /// Background session handle; dropping it unmounts.
    pub fn spawn_mount(config: &MountConfig) -> Result<fuser::BackgroundSession, VfsError> {
        let fs: SegcatFs = SegcatFs::from_config(config)?;
        let mountpoint: &Path = &config.mountpoint;

        tracing::info!(mountpoint = %mountpoint.display(), "Mounting in background");
        warn_implicit_allow_other(&config.mount);
        fuser::spawn_mount2(fs, mountpoint, &mount_options(&config.mount))
            .map_err(|e| VfsError::MountFailed(e.to_string()))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::handlers::fixed_timestamp;

        #[test]
        fn test_mount_options_default() {
            let opts: Vec<MountOption> = mount_options(&MountOptions::default());
            assert_eq!(
                opts,
                vec![
                    MountOption::FSName("segcat".to_string()),
                    MountOption::RW,
                    MountOption::AutoUnmount,
                    MountOption::DefaultPermissions,
                ]
            );
        }

        #[test]
        fn test_mount_options_read_only_shared() {
            let options: MountOptions = MountOptions::default()
                .with_read_only(true)
                .with_allow_other(true)
                .with_auto_unmount(false)
                .with_fs_name("hello");
            let opts: Vec<MountOption> = mount_options(&options);
            assert!(opts.contains(&MountOption::RO));
            assert!(opts.contains(&MountOption::AllowOther));
            assert!(!opts.contains(&MountOption::AutoUnmount));
            assert!(opts.contains(&MountOption::FSName("hello".to_string())));
        }

        #[test]
        fn test_to_file_attr() {
            let attr = EntryAttr {
                ino: 2,
                kind: EntryKind::RegularFile,
                perm: 0o666,
                size: 1025,
                blocks: 3,
                nlink: 1,
                uid: 1000,
                gid: 1000,
                time: fixed_timestamp(),
            };
            let fattr: FileAttr = to_file_attr(&attr);
            assert_eq!(fattr.kind, FileType::RegularFile);
            assert_eq!(fattr.perm, 0o666);
            assert_eq!(fattr.size, 1025);
            assert_eq!(fattr.blocks, 3);
            assert_eq!(fattr.mtime, fixed_timestamp());
            assert_eq!(fattr.blksize, 512);
        }
    }
}

#[cfg(feature = "fuse")]
pub use impl_fuse::{mount, mount_options, spawn_mount, SegcatFs};
