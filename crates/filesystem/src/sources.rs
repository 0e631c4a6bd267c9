//! Validation of explicitly listed backing files.

use std::collections::HashMap;
use std::fs::Metadata;
use std::io::ErrorKind;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use segcat_common::normalize_source;

use crate::error::FileSystemError;

/// Check that every backing path is an existing regular file.
///
/// Symlinks are followed and order is preserved. Each file may appear only
/// once: a repeated path, or a symlink or hard link to a file already listed,
/// would make two virtual ranges share the same bytes.
///
/// # Arguments
/// * `paths` - Backing files in virtual-file order
///
/// # Returns
/// Absolute, lexically normalized paths in the same order.
///
/// # Errors
/// Returns error if the list is empty, any path is missing or not a regular
/// file, or two paths name the same file.
pub fn validate_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>, FileSystemError> {
    if paths.is_empty() {
        return Err(FileSystemError::NoSources);
    }

    let mut seen: HashMap<(u64, u64), PathBuf> = HashMap::with_capacity(paths.len());
    let mut validated: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths {
        let (normalized, metadata) = validate_source(path)?;
        let file_id: (u64, u64) = (metadata.dev(), metadata.ino());
        if let Some(first) = seen.get(&file_id) {
            return Err(FileSystemError::DuplicateSource {
                path: normalized,
                first: first.clone(),
            });
        }
        seen.insert(file_id, normalized.clone());
        validated.push(normalized);
    }
    Ok(validated)
}

/// Validate a single backing path.
fn validate_source(path: &Path) -> Result<(PathBuf, Metadata), FileSystemError> {
    let metadata: Metadata = std::fs::metadata(path).map_err(|e: std::io::Error| {
        if e.kind() == ErrorKind::NotFound {
            FileSystemError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            FileSystemError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    if !metadata.is_file() {
        return Err(FileSystemError::NotARegularFile {
            path: path.to_path_buf(),
        });
    }

    Ok((normalize_source(path)?, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_keeps_order() {
        let dir: TempDir = TempDir::new().unwrap();
        let a: PathBuf = dir.path().join("a");
        let b: PathBuf = dir.path().join("b");
        std::fs::write(&a, b"aaaa").unwrap();
        std::fs::write(&b, b"bbb").unwrap();

        let validated: Vec<PathBuf> = validate_sources(&[b.clone(), a.clone()]).unwrap();
        assert_eq!(validated, vec![b, a]);
    }

    #[test]
    fn test_validate_normalizes() {
        let dir: TempDir = TempDir::new().unwrap();
        let a: PathBuf = dir.path().join("a");
        std::fs::write(&a, b"a").unwrap();

        let dotted: PathBuf = dir.path().join(".").join("a");
        let validated: Vec<PathBuf> = validate_sources(&[dotted]).unwrap();
        assert_eq!(validated, vec![a]);
    }

    #[test]
    fn test_validate_empty() {
        assert!(matches!(validate_sources(&[]), Err(FileSystemError::NoSources)));
    }

    #[test]
    fn test_validate_missing() {
        let dir: TempDir = TempDir::new().unwrap();
        let missing: PathBuf = dir.path().join("missing");

        let result = validate_sources(&[missing]);
        assert!(matches!(result, Err(FileSystemError::NotFound { .. })));
    }

    #[test]
    fn test_validate_rejects_repeated_path() {
        let dir: TempDir = TempDir::new().unwrap();
        let a: PathBuf = dir.path().join("a");
        let b: PathBuf = dir.path().join("b");
        std::fs::write(&a, b"aaaa").unwrap();
        std::fs::write(&b, b"bbb").unwrap();

        let result = validate_sources(&[a.clone(), b, a.clone()]);
        match result {
            Err(FileSystemError::DuplicateSource { path, first }) => {
                assert_eq!(path, a);
                assert_eq!(first, a);
            }
            other => panic!("expected DuplicateSource, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_symlink_alias() {
        let dir: TempDir = TempDir::new().unwrap();
        let a: PathBuf = dir.path().join("a");
        let alias: PathBuf = dir.path().join("alias");
        std::fs::write(&a, b"aaaa").unwrap();
        std::os::unix::fs::symlink(&a, &alias).unwrap();

        let result = validate_sources(&[a, alias]);
        assert!(matches!(result, Err(FileSystemError::DuplicateSource { .. })));
    }

    #[test]
    fn test_validate_directory() {
        let dir: TempDir = TempDir::new().unwrap();

        let result = validate_sources(&[dir.path().to_path_buf()]);
        assert!(matches!(result, Err(FileSystemError::NotARegularFile { .. })));
    }
}
