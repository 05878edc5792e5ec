//! Byte-level text primitives for the SQL rewriter.
//!
//! The rewriter never parses SQL; it only needs a case-insensitive locate
//! and a scanner that can step over single-quoted literals without being
//! fooled by doubled-apostrophe escapes.

/// Locate `needle` in `haystack`, folding ASCII case only.
///
/// Returns the byte offset of the first occurrence.
pub fn find_nocase(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.len() > h.len() {
        return None;
    }
    h.windows(n.len()).position(|w| w.eq_ignore_ascii_case(n))
}

/// Find the closing apostrophe of the SQL string literal opening at `open`.
///
/// `s[open]` must be `'`. A doubled apostrophe inside the literal is an
/// escape and does not terminate it; a lone apostrophe does. Returns the
/// byte offset of the closing apostrophe, or `None` if the input ends
/// before the literal does.
pub fn quoted_literal_end(s: &str, open: usize) -> Option<usize> {
    let b = s.as_bytes();
    debug_assert_eq!(b.get(open), Some(&b'\''));
    let mut i = open + 1;
    while i < b.len() {
        if b[i] == b'\'' {
            if b.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            return Some(i);
        }
        i += 1;
    }
    None
}
