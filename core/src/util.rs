//! Shared utility functions for the application

use anyhow::{bail, Result};

/// Reject credential values that cannot travel in an HTTP header or query
///
/// Control characters, DEL, newlines and null bytes are refused. The value
/// itself is never echoed back in the error.
pub fn validate_credential(value: &str, field_name: &str) -> Result<String> {
    let trimmed = value.trim();

    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        bail!("{} is empty or set to 'none'", field_name);
    }

    for (index, ch) in trimmed.char_indices() {
        if ch.is_control() || ch == '\u{7f}' {
            bail!(
                "{} contains invalid character at position {}. \
                Control characters, newlines, carriage returns, and null bytes are not allowed.",
                field_name,
                index
            );
        }
    }

    Ok(trimmed.to_string())
}

/// Sanitize a base URL for API requests
///
/// Ensures the URL has a scheme and isn't double-encoded.
pub fn sanitize_base_url(url: &str, field_name: &str) -> Result<String> {
    let trimmed = url.trim();

    if trimmed.is_empty() {
        bail!("{} cannot be empty", field_name);
    }

    // Encoded separators indicate double-encoding or a corrupted value
    if trimmed.contains("%2F") || trimmed.contains("%3D") || trimmed.contains("%20") {
        bail!(
            "{} appears to contain URL-encoded characters (e.g., %2F, %3D, %20). \
            Please verify the URL is not double-encoded.",
            field_name
        );
    }

    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        bail!(
            "{} must start with 'http://' or 'https://'. Got: {}",
            field_name,
            trimmed
        );
    }

    Ok(trimmed.to_string())
}

/// First `n` characters of `text` (not bytes)
pub fn take_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Cap `text` at `limit` characters, replacing the tail with `marker`
///
/// Text within the limit is returned unchanged. Otherwise the result is
/// exactly `limit` characters long and ends with `marker`.
pub fn truncate_with_marker(text: &str, limit: usize, marker: &str) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(marker.chars().count());
    format!("{}{}", take_chars(text, keep), marker)
}

/// Mask a secret for logging (first 4 characters only)
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() > 8 {
        format!("{}...", take_chars(secret, 4))
    } else {
        "***".to_string()
    }
}
