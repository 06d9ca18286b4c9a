use crate::constants::FILENAME_PATTERN;
use crate::errors::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

/// Cached regex for the quoted filename in a `Content-Disposition` header.
static FILENAME_REGEX: OnceLock<Regex> = OnceLock::new();

/// Extracts the server-chosen filename from a `Content-Disposition` value.
///
/// The filename must be quoted and consist only of word characters, dots,
/// underscores and hyphens, so it can never name a path outside the output
/// directory. Other attributes in the header are ignored.
///
/// # Errors
///
/// `ExportFormat` if the header is absent or carries no matching filename.
pub fn filename_from_content_disposition(header: Option<&str>) -> AppResult<String> {
    let header = header.ok_or_else(|| {
        AppError::ExportFormat("response has no Content-Disposition header".into())
    })?;

    let regex = FILENAME_REGEX.get_or_init(|| {
        Regex::new(FILENAME_PATTERN).expect("FILENAME_PATTERN is a valid regex pattern")
    });

    regex
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            AppError::ExportFormat(format!(
                "could not extract filename from Content-Disposition: {header}"
            ))
        })
}
