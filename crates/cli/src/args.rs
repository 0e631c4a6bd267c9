//! Command-line arguments and their conversion into a mount configuration.

use std::path::{Path, PathBuf};

use clap::Parser;
use segcat_common::{parse_mode, DEFAULT_FS_NAME};
use segcat_filesystem::{discover_sequence, validate_sources, FileSystemError};
use segcat_vfs::{KernelCacheOptions, MountConfig, MountOptions, VfsError};
use thiserror::Error;

/// Mount a sequence of files as a single virtual file.
#[derive(Debug, Parser)]
#[command(name = "segcat", version)]
pub struct Args {
    /// Directory to mount on.
    pub mountpoint: PathBuf,

    /// Backing files, in order.
    #[arg(required_unless_present = "sequence", conflicts_with = "sequence")]
    pub sources: Vec<PathBuf>,

    /// Discover backing files named <BASE>.000, <BASE>.001, ...
    #[arg(long, value_name = "BASE")]
    pub sequence: Option<PathBuf>,

    /// Name of the virtual file (defaults to the sequence base name).
    #[arg(long, short)]
    pub name: Option<String>,

    /// Permission bits of the virtual file, in octal.
    #[arg(long, short, default_value = "666", value_parser = parse_mode_arg)]
    pub mode: u16,

    /// Filesystem name shown in the mount table.
    #[arg(long, default_value = DEFAULT_FS_NAME)]
    pub fsname: String,

    /// Mount read-only.
    #[arg(long)]
    pub read_only: bool,

    /// Allow other users to access the mount.
    #[arg(long)]
    pub allow_other: bool,

    /// Keep the mount when the process exits.
    ///
    /// Auto-unmount makes fuser add allow_other, which a non-root user may
    /// only use when /etc/fuse.conf contains user_allow_other. Pass this
    /// flag to mount without that setting.
    #[arg(long)]
    pub no_auto_unmount: bool,

    /// Attribute and entry cache timeout in seconds.
    #[arg(long, default_value_t = 1)]
    pub cache_timeout: u64,

    /// Keep the kernel page cache across opens of the virtual file.
    ///
    /// Only safe when the backing files are not changed behind the mount.
    #[arg(long)]
    pub keep_cache: bool,

    /// Log every filesystem request.
    #[arg(long, short)]
    pub debug: bool,
}

/// Errors turning arguments into a mount configuration.
#[derive(Debug, Error)]
pub enum CliError {
    /// No virtual file name given and none could be derived.
    #[error("--name is required when backing files are listed explicitly")]
    MissingName,

    /// Backing file discovery or validation failed.
    #[error(transparent)]
    FileSystem(#[from] FileSystemError),

    /// The resulting configuration is invalid.
    #[error(transparent)]
    Vfs(#[from] VfsError),
}

fn parse_mode_arg(s: &str) -> Result<u16, String> {
    parse_mode(s).map_err(|e| e.to_string())
}

impl Args {
    /// Resolve backing files and build the mount configuration.
    ///
    /// # Errors
    /// Returns error if backing files cannot be found, no name is available,
    /// or the configuration fails validation.
    pub fn into_config(self) -> Result<MountConfig, CliError> {
        let (sources, default_name): (Vec<PathBuf>, Option<String>) = match &self.sequence {
            Some(base) => (discover_sequence(base)?, base_name(base)),
            None => (self.sources.clone(), None),
        };
        let sources: Vec<PathBuf> = validate_sources(&sources)?;

        let file_name: String = self.name.or(default_name).ok_or(CliError::MissingName)?;

        let mount: MountOptions = MountOptions::default()
            .with_fs_name(self.fsname)
            .with_read_only(self.read_only)
            .with_allow_other(self.allow_other)
            .with_auto_unmount(!self.no_auto_unmount)
            .with_debug(self.debug);

        let kernel_cache = KernelCacheOptions {
            keep_page_cache: self.keep_cache,
            attr_timeout_secs: self.cache_timeout,
            entry_timeout_secs: self.cache_timeout,
        };

        let config: MountConfig = MountConfig::new(sources, file_name, self.mountpoint)
            .with_mode(self.mode)
            .with_mount_options(mount)
            .with_kernel_cache(kernel_cache);
        config.validate()?;
        Ok(config)
    }
}

fn base_name(base: &Path) -> Option<String> {
    base.file_name()
        .and_then(|n| n.to_str())
        .map(|n: &str| n.to_string())
}
