//! Filesystem-safe filename components.

/// Used when a title sanitizes down to nothing.
pub const UNTITLED: &str = "untitled";

/// Linux NAME_MAX, in bytes.
pub const NAME_MAX: usize = 255;

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
pub(crate) fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut take = max;
    while take > 0 && !s.is_char_boundary(take) {
        take -= 1;
    }
    &s[..take]
}

/// Sanitizes one filename component (a title, a container, a server file name).
///
/// - Replaces NUL, `/`, `\`, and control characters with `_`
/// - Trims leading/trailing whitespace and dots
/// - Limits length to 255 bytes (Linux NAME_MAX)
///
/// Spaces inside the name are kept: `Song A` stays `Song A`.
pub fn sanitize_component(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c == '\0' || c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim_matches(|c: char| c.is_whitespace() || c == '.');

    truncate_bytes(trimmed, NAME_MAX).to_string()
}
