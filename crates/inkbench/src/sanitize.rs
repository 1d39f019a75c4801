//! Helpers for sanitizing data before it enters tracing span attributes.
//!
//! Client-supplied filenames and content digests show up in almost every
//! span; these functions keep the attributes short and free of anything
//! resembling a path.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Returns the first 8 characters of a content digest for log correlation.
pub fn short_hash(hash: &str) -> &str {
    let end = hash
        .char_indices()
        .nth(8)
        .map(|(i, _)| i)
        .unwrap_or(hash.len());
    &hash[..end]
}
