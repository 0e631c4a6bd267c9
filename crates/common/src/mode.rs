//! Octal permission mode parsing.

use crate::constants::MAX_FILE_MODE;
use crate::error::ModeError;

/// Parse an octal permission mode such as `644`, `0644` or `0o644`.
///
/// # Arguments
/// * `input` - Mode string as typed by a user
///
/// # Returns
/// Permission bits limited to owner/group/other.
///
/// # Errors
/// Returns error if the input is empty, not octal, or above `0o777`.
pub fn parse_mode(input: &str) -> Result<u16, ModeError> {
    let trimmed: &str = input.trim();
    let digits: &str = trimmed
        .strip_prefix("0o")
        .or_else(|| trimmed.strip_prefix("0O"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(ModeError::Empty);
    }

    let value: u32 = u32::from_str_radix(digits, 8).map_err(|_| ModeError::NotOctal {
        value: input.to_string(),
    })?;

    validate_mode(value)
}

/// Check that a numeric mode only carries permission bits.
///
/// # Arguments
/// * `value` - Mode to check
///
/// # Errors
/// Returns error if any bit above `0o777` is set.
pub fn validate_mode(value: u32) -> Result<u16, ModeError> {
    if value > u32::from(MAX_FILE_MODE) {
        return Err(ModeError::OutOfRange {
            value,
            max: MAX_FILE_MODE,
        });
    }
    Ok(value as u16)
}
