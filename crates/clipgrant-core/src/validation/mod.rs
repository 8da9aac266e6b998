//! Input validation shared by the HTTP boundary

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::{DEFAULT_FILE_EXTENSION, MAX_FILE_EXTENSION_LEN};
use crate::error::AppError;

static EXTENSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[a-zA-Z0-9]+$").unwrap()
});

/// Sanitize a caller-supplied file extension.
///
/// Leading dots are stripped and an absent or empty value falls back to `mp4`.
/// Whatever remains must be ASCII alphanumeric, since it ends up inside the object key.
pub fn normalize_file_extension(raw: Option<&str>) -> Result<String, AppError> {
    let trimmed = raw.map(|s| s.trim().trim_start_matches('.')).unwrap_or("");

    if trimmed.is_empty() {
        return Ok(DEFAULT_FILE_EXTENSION.to_string());
    }

    if trimmed.len() > MAX_FILE_EXTENSION_LEN {
        return Err(AppError::Validation(format!(
            "file_extension must be at most {} characters",
            MAX_FILE_EXTENSION_LEN
        )));
    }

    if !EXTENSION_PATTERN.is_match(trimmed) {
        return Err(AppError::Validation(format!(
            "file_extension '{}' must contain only letters and digits",
            trimmed
        )));
    }

    Ok(trimmed.to_string())
}
