//! Backing file discovery for segcat.
//!
//! This crate locates the real files that make up a virtual file:
//! - `discover_sequence()` - Find `foo.000`, `foo.001`, ... for a base path `foo`
//! - `validate_sources()` - Check an explicit list of backing files

pub mod error;
pub mod sequence;
pub mod sources;

// Re-export main types
pub use error::FileSystemError;
pub use sequence::{discover_parts, discover_sequence, SequencePart};
pub use sources::validate_sources;
