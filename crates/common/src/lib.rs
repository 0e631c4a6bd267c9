//! Shared types and utilities for segcat.
//!
//! This crate provides common functionality used across all segcat crates:
//! - Reserved inode numbers and fixed attribute values
//! - Path normalization and entry name validation
//! - Octal permission mode parsing
//! - Shared error types

pub mod constants;
pub mod error;
pub mod mode;
pub mod path_utils;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{ModeError, PathError};
pub use mode::{parse_mode, validate_mode};
pub use path_utils::{lexical_normalize, normalize_source, to_absolute, validate_entry_name};
