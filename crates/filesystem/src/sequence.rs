//! Discovery of numbered backing file sequences.
//!
//! Split files are commonly stored as `foo.000`, `foo.001`, ... next to each
//! other. Given the base path `foo`, this module finds every part and orders
//! them by numeric suffix so `foo.9` comes before `foo.10`.

use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::{DirEntry, WalkDir};

use crate::error::FileSystemError;

/// One discovered part of a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePart {
    /// Numeric suffix of the part.
    pub index: u64,
    /// Full path to the part.
    pub path: PathBuf,
}

/// Find the ordered parts of the sequence rooted at `base`.
///
/// # Arguments
/// * `base` - Path without the numeric suffix (e.g. `/data/foo` for `/data/foo.000`)
///
/// # Returns
/// Part paths in ascending index order.
///
/// # Errors
/// Returns error if the directory cannot be scanned, no parts exist,
/// an index repeats, or the numbering has a gap.
pub fn discover_sequence(base: &Path) -> Result<Vec<PathBuf>, FileSystemError> {
    let parts: Vec<SequencePart> = discover_parts(base)?;
    Ok(parts.into_iter().map(|p: SequencePart| p.path).collect())
}

/// Find the ordered parts of a sequence, keeping their indices.
///
/// # Arguments
/// * `base` - Path without the numeric suffix
///
/// # Errors
/// Same as [`discover_sequence`].
pub fn discover_parts(base: &Path) -> Result<Vec<SequencePart>, FileSystemError> {
    let stem: &str = base
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n: &&str| !n.is_empty())
        .ok_or_else(|| FileSystemError::InvalidBase {
            path: base.to_path_buf(),
        })?;

    let dir: &Path = match base.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let pattern: Regex = part_pattern(stem)?;
    let mut parts: Vec<SequencePart> = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry: DirEntry = entry.map_err(|e: walkdir::Error| FileSystemError::Walk {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let name: &str = match entry.file_name().to_str() {
            Some(n) => n,
            None => continue,
        };

        let Some(index) = parse_index(&pattern, name) else {
            continue;
        };

        parts.push(SequencePart {
            index,
            path: entry.into_path(),
        });
    }

    if parts.is_empty() {
        return Err(FileSystemError::NoSequenceParts {
            base: base.to_path_buf(),
        });
    }

    parts.sort_by(|a: &SequencePart, b: &SequencePart| {
        a.index.cmp(&b.index).then_with(|| a.path.cmp(&b.path))
    });
    check_numbering(&parts)?;

    tracing::debug!(base = %base.display(), parts = parts.len(), "Discovered sequence");
    Ok(parts)
}

/// Build the `^<stem>\.(\d+)$` matcher for a sequence stem.
fn part_pattern(stem: &str) -> Result<Regex, FileSystemError> {
    Regex::new(&format!(r"^{}\.(\d+)$", regex::escape(stem))).map_err(|_| {
        FileSystemError::InvalidBase {
            path: PathBuf::from(stem),
        }
    })
}

/// Extract the numeric suffix from a part name, if it belongs to the sequence.
fn parse_index(pattern: &Regex, name: &str) -> Option<u64> {
    let captures = pattern.captures(name)?;
    let digits: &str = captures.get(1)?.as_str();
    match digits.parse::<u64>() {
        Ok(index) => Some(index),
        Err(_) => {
            tracing::warn!(name, "Ignoring sequence part with oversized index");
            None
        }
    }
}

/// Numbering must start at 0 or 1 and increase by one without repeats.
fn check_numbering(parts: &[SequencePart]) -> Result<(), FileSystemError> {
    let first: u64 = parts[0].index;
    if first > 1 {
        return Err(FileSystemError::SequenceGap {
            expected: 0,
            found: first,
        });
    }

    for pair in parts.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.index == next.index {
            return Err(FileSystemError::DuplicateIndex {
                index: prev.index,
                first: prev.path.clone(),
                second: next.path.clone(),
            });
        }
        if next.index != prev.index + 1 {
            return Err(FileSystemError::SequenceGap {
                expected: prev.index + 1,
                found: next.index,
            });
        }
    }
    Ok(())
}
