//! Small string helpers shared across crates.

use std::sync::LazyLock;

use regex::Regex;

use crate::constants::MAX_SLUG_LEN;

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W+").unwrap());

/// Filesystem-safe slug: lowercase, non-word runs collapsed to `_`, capped length.
#[must_use]
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    NON_WORD.replace_all(&lowered, "_").chars().take(MAX_SLUG_LEN).collect()
}

/// Truncates a string to the given maximum length at a char boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        s.get(..end).unwrap_or("")
    }
}
