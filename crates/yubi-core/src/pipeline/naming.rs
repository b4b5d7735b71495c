//! Output file naming.

use crate::types::TargetFormat;

/// Stem used when sanitizing leaves nothing behind.
const FALLBACK_STEM: &str = "image";

/// Build the download name for `original`, e.g. `yubi-holiday-photo.jpeg`.
pub fn output_file_name(original: &str, prefix: &str, format: TargetFormat) -> String {
    let stem = sanitize(strip_extension(original));
    let stem = if stem.is_empty() { FALLBACK_STEM.to_string() } else { stem };
    format!("{}-{}.{}", prefix, stem, format.extension())
}

/// Drop the final `.ext` component. Only a non-empty suffix with no `/` counts.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) => {
            let ext = &name[dot + 1..];
            if ext.is_empty() || ext.contains('/') {
                name
            } else {
                &name[..dot]
            }
        }
        None => name,
    }
}

/// Lowercase, collapse every run of characters outside `[a-z0-9]` into one
/// hyphen, then trim hyphens from both ends.
pub fn sanitize(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    let mut pending_hyphen = false;

    for c in stem.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    out
}
