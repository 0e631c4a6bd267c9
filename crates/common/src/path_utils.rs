//! Path normalization utilities for backing files and the virtual file name.

use std::path::{Component, Path, PathBuf};

use crate::error::PathError;

/// Convert a path to absolute without resolving symlinks.
///
/// # Arguments
/// * `path` - Path to convert (relative or absolute)
///
/// # Returns
/// Absolute path, joining with current directory if relative.
///
/// # Errors
/// Returns error if current directory cannot be determined.
pub fn to_absolute(path: &Path) -> Result<PathBuf, PathError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        std::env::current_dir()
            .map(|cwd: PathBuf| cwd.join(path))
            .map_err(|e: std::io::Error| PathError::from_io(path.display().to_string(), e))
    }
}

/// Lexical path normalization without filesystem access.
///
/// Removes `.` components and resolves `..` components lexically.
///
/// # Arguments
/// * `path` - Path to normalize
///
/// # Returns
/// Normalized path with `.` and `..` resolved lexically.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !components.is_empty()
                    && !matches!(
                        components.last(),
                        Some(Component::ParentDir) | Some(Component::RootDir)
                    )
                {
                    components.pop();
                } else {
                    components.push(component);
                }
            }
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

/// Absolute, lexically normalized form of a backing file path.
///
/// # Arguments
/// * `path` - Backing file path as given on the command line
///
/// # Errors
/// Returns error if the current directory cannot be determined.
pub fn normalize_source(path: &Path) -> Result<PathBuf, PathError> {
    let abs_path: PathBuf = to_absolute(path)?;
    Ok(lexical_normalize(&abs_path))
}

/// Check that a name can be exposed as a single entry under the mount root.
///
/// The name must be a single, non-empty path component: no `/`, no NUL,
/// and not `.` or `..`.
///
/// # Arguments
/// * `name` - Candidate file name
///
/// # Errors
/// Returns `PathError::InvalidPath` if the name is unusable.
pub fn validate_entry_name(name: &str) -> Result<(), PathError> {
    let invalid: bool = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\0');

    if invalid {
        return Err(PathError::InvalidPath {
            path: name.to_string(),
        });
    }
    Ok(())
}
