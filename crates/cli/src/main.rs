//! segcat binary
//!
//! Mounts an ordered list of files as one virtual file.
//!
//! ## Usage
//!
//! ```bash
//! # Explicit backing files
//! segcat --name foo /mnt/foo /data/foo.000 /data/foo.001
//!
//! # Discover /data/foo.000, /data/foo.001, ... and expose them as "foo"
//! segcat --sequence /data/foo --mode 644 /mnt/foo
//! ```
//!
//! The process serves requests until the mount is removed
//! (`fusermount -u /mnt/foo`).

mod args;

use std::process::ExitCode;

use clap::Parser;
use segcat_vfs::MountConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::args::Args;

fn init_tracing(debug: bool) {
    let default_level: &str = if debug { "debug" } else { "info" };
    let filter: EnvFilter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let args: Args = Args::parse();
    init_tracing(args.debug);

    let config: MountConfig = match args.into_config() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        file_name = %config.file_name,
        parts = config.sources.len(),
        mode = %format!("{:o}", config.mode),
        "Starting segcat"
    );

    match segcat_vfs::mount(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
