//! Full-text-search rewrite.
//!
//! The shadow database has no FTS virtual tables, so any statement that
//! joins against one or filters with `MATCH` must be rewritten before the
//! shadow sees it. This is deliberately not a SQL parser: a fixed
//! allow-list of join prefixes and `MATCH` left-hand sides is excised or
//! replaced, and everything outside the list passes through untouched.

use crate::scan;

/// Fast-exit marker: statements without it are never rewritten.
const FTS_MARKER: &str = "fts4_";

/// Join prefixes to excise, longest variant first.
const JOIN_PREFIXES: [&str; 4] = [
    "join fts4_metadata_titles_icu",
    "join fts4_metadata_titles",
    "join fts4_tag_titles_icu",
    "join fts4_tag_titles",
];

/// Keywords that end an excised join run. Each carries its surrounding
/// whitespace so identifiers like `left_side` do not terminate early.
const CLAUSE_BOUNDARIES: [&str; 5] = [" where ", " join ", " left ", " group ", " order "];

/// `MATCH` left-hand sides whose whole predicate (through the closing
/// apostrophe of the argument) is replaced.
const MATCH_PREFIXES: [&str; 8] = [
    "fts4_metadata_titles_icu.title match ",
    "fts4_metadata_titles_icu.title_sort match ",
    "fts4_metadata_titles.title match ",
    "fts4_metadata_titles.title_sort match ",
    "fts4_tag_titles_icu.title match ",
    "fts4_tag_titles_icu.tag match ",
    "fts4_tag_titles.title match ",
    "fts4_tag_titles.tag match ",
];

/// Constant-false replacement. The shadow backend runs the real full-text
/// search; the local plan must contribute no rows, so this is `1=0` and
/// never `1=1`.
const MATCH_REPLACEMENT: &str = "1=0";

/// Rewrite `sql` so it no longer references FTS virtual tables.
///
/// Returns `None` when no rewrite is required (no `fts4_` anywhere in the
/// statement, compared case-insensitively); otherwise a freshly owned
/// statement with FTS joins stripped and `MATCH` predicates replaced by a
/// constant-false condition.
pub fn rewrite_fts(sql: &str) -> Option<String> {
    scan::find_nocase(sql, FTS_MARKER)?;

    let mut buf = sql.to_string();
    strip_fts_joins(&mut buf);
    rewrite_match_predicates(&mut buf);

    log::debug!("fts rewrite applied ({} -> {} bytes)", sql.len(), buf.len());
    Some(buf)
}

/// Excise each recognized `JOIN fts4_*` run up to the next clause boundary
/// (or end of statement).
fn strip_fts_joins(buf: &mut String) {
    for prefix in JOIN_PREFIXES {
        while let Some(start) = scan::find_nocase(buf, prefix) {
            let end = clause_boundary(buf, start);
            buf.replace_range(start..end, "");
        }
    }
}

/// First offset at or after `from` where a clause-boundary keyword begins,
/// or the end of the buffer.
fn clause_boundary(buf: &str, from: usize) -> usize {
    let bytes = buf.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        for kw in CLAUSE_BOUNDARIES {
            let k = kw.as_bytes();
            if i + k.len() <= bytes.len() && bytes[i..i + k.len()].eq_ignore_ascii_case(k) {
                return i;
            }
        }
        i += 1;
    }
    bytes.len()
}

/// Replace each recognized `fts4_*.col MATCH '...'` predicate, argument
/// literal included, with the constant-false condition.
fn rewrite_match_predicates(buf: &mut String) {
    for prefix in MATCH_PREFIXES {
        while let Some(start) = scan::find_nocase(buf, prefix) {
            let open = match buf[start..].find('\'') {
                Some(off) => start + off,
                // No argument literal; leave this pattern alone.
                None => break,
            };
            let close = match scan::quoted_literal_end(buf, open) {
                Some(c) => c,
                // Unterminated literal: stop rewriting at this pattern and
                // return the buffer as rewritten so far.
                None => break,
            };
            buf.replace_range(start..=close, MATCH_REPLACEMENT);
        }
    }
}
