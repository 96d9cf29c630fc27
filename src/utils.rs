//! Small helpers shared across verchain
//!
//! - Human-readable byte formatting for change descriptions and CLI output
//! - Turning arbitrary file ids into safe single path components
//! - MIME type guessing from file names

use std::path::Path;

/// Format a byte count for display
///
/// # Example
///
/// ```rust
/// use verchain::utils::format_bytes;
///
/// assert_eq!(format_bytes(100), "100 B");
/// assert_eq!(format_bytes(1536), "1.50 KB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Turn a file id into a single safe path component
///
/// Anything outside `[A-Za-z0-9._-]` becomes `_`, and ids made only of dots
/// are prefixed so they can never name `.` or `..`. Different ids may map to
/// the same component; storage paths stay unique because they also embed the
/// version id.
pub fn sanitize_component(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if out.is_empty() || out.chars().all(|c| c == '.') {
        out.insert(0, '_');
    }
    out
}

/// Guess a MIME type from a file name, defaulting to `application/octet-stream`
pub fn guess_mime_type(file_name: &str) -> String {
    mime_guess::from_path(Path::new(file_name))
        .first_or_octet_stream()
        .to_string()
}
