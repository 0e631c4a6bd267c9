//! Mount-time configuration for the VFS.
//!
//! A [`MountConfig`] is built once (normally by the CLI), validated, and then
//! handed by value to the filesystem. Nothing in it changes while mounted.

use std::path::PathBuf;

use segcat_common::{validate_entry_name, validate_mode, DEFAULT_FILE_MODE, DEFAULT_FS_NAME};

use crate::VfsError;

/// Everything needed to mount a set of backing files as one virtual file.
///
/// # Example
///
/// ```ignore
/// let config = MountConfig::new(vec!["foo.000".into(), "foo.001".into()], "foo", "/mnt/foo")
///     .with_mode(0o644)
///     .with_mount_options(MountOptions::default().with_read_only(true));
///
/// segcat_vfs::mount(&config)?;
/// ```
#[derive(Debug, Clone)]
pub struct MountConfig {
    /// Backing files in virtual-file order.
    pub sources: Vec<PathBuf>,
    /// Name of the virtual file under the mount root.
    pub file_name: String,
    /// Permission bits of the virtual file.
    pub mode: u16,
    /// Directory to mount on.
    pub mountpoint: PathBuf,
    /// FUSE mount options.
    pub mount: MountOptions,
    /// Kernel cache settings.
    pub kernel_cache: KernelCacheOptions,
}

impl MountConfig {
    /// Create a configuration with default mode and options.
    ///
    /// # Arguments
    /// * `sources` - Backing files in order
    /// * `file_name` - Name of the virtual file
    /// * `mountpoint` - Directory to mount on
    pub fn new(
        sources: Vec<PathBuf>,
        file_name: impl Into<String>,
        mountpoint: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sources,
            file_name: file_name.into(),
            mode: DEFAULT_FILE_MODE,
            mountpoint: mountpoint.into(),
            mount: MountOptions::default(),
            kernel_cache: KernelCacheOptions::default(),
        }
    }

    /// Set the virtual file's permission bits.
    ///
    /// # Arguments
    /// * `mode` - Permission bits (0..=0o777)
    pub fn with_mode(mut self, mode: u16) -> Self {
        self.mode = mode;
        self
    }

    /// Set FUSE mount options.
    ///
    /// # Arguments
    /// * `mount` - Mount options
    pub fn with_mount_options(mut self, mount: MountOptions) -> Self {
        self.mount = mount;
        self
    }

    /// Set kernel cache options.
    ///
    /// # Arguments
    /// * `kernel_cache` - Kernel cache configuration
    pub fn with_kernel_cache(mut self, kernel_cache: KernelCacheOptions) -> Self {
        self.kernel_cache = kernel_cache;
        self
    }

    /// Check the parts of the configuration that do not touch the disk.
    ///
    /// Backing files are checked when they are opened.
    ///
    /// # Errors
    /// Returns `VfsError::InvalidConfig` for an unusable file name or mode.
    pub fn validate(&self) -> Result<(), VfsError> {
        validate_entry_name(&self.file_name)
            .map_err(|e| VfsError::InvalidConfig(format!("file name: {}", e)))?;
        validate_mode(u32::from(self.mode))
            .map_err(|e| VfsError::InvalidConfig(e.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// Mount Options
// ============================================================================

/// Options passed to the FUSE mount.
#[derive(Debug, Clone)]
pub struct MountOptions {
    /// Filesystem name shown in the mount table.
    pub fs_name: String,
    /// Mount read-only and open backing files read-only.
    pub read_only: bool,
    /// Allow users other than the mounting user to access the mount.
    pub allow_other: bool,
    /// Unmount automatically when the process exits.
    ///
    /// fuser adds `allow_other` whenever `auto_unmount` is set, so for a
    /// non-root user the mount fails unless `/etc/fuse.conf` contains
    /// `user_allow_other`. Turn this off to mount without that setting.
    pub auto_unmount: bool,
    /// Let the kernel check access against the reported mode.
    pub default_permissions: bool,
    /// Log every filesystem request at debug level.
    pub debug: bool,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            fs_name: DEFAULT_FS_NAME.to_string(),
            read_only: false,
            allow_other: false,
            auto_unmount: true,
            default_permissions: true,
            debug: false,
        }
    }
}

impl MountOptions {
    /// Set the filesystem name.
    pub fn with_fs_name(mut self, fs_name: impl Into<String>) -> Self {
        self.fs_name = fs_name.into();
        self
    }

    /// Set read-only mode.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Allow other users to access the mount.
    pub fn with_allow_other(mut self, allow_other: bool) -> Self {
        self.allow_other = allow_other;
        self
    }

    /// Set automatic unmount on exit.
    pub fn with_auto_unmount(mut self, auto_unmount: bool) -> Self {
        self.auto_unmount = auto_unmount;
        self
    }

    /// Enable request-level debug logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Whether the mount ends up with `allow_other`, either requested
    /// directly or added by fuser alongside `auto_unmount`.
    pub fn effective_allow_other(&self) -> bool {
        self.allow_other || self.auto_unmount
    }
}

// ============================================================================
// Kernel Cache Options
// ============================================================================

/// Options for kernel-level caching (FUSE).
///
/// Backing files may be modified by other processes, so defaults are short.
#[derive(Debug, Clone)]
pub struct KernelCacheOptions {
    /// Keep the kernel page cache across opens of the virtual file.
    pub keep_page_cache: bool,

    /// Attribute cache timeout in seconds.
    pub attr_timeout_secs: u64,

    /// Entry cache timeout in seconds.
    pub entry_timeout_secs: u64,
}

impl Default for KernelCacheOptions {
    fn default() -> Self {
        Self {
            keep_page_cache: false,
            attr_timeout_secs: 1,
            entry_timeout_secs: 1,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
