//! Declared-column-type normalization.
//!
//! The shadow backend reports declared types the host's access layer has
//! never seen (host-specific annotations like `DT_INTEGER(8)`, or
//! `boolean`, which SQLite stores as an integer). Everything is folded
//! into the five canonical SQLite type tags, with `TEXT` as the safe
//! default for anything unrecognized.

use std::fmt;

/// The closed set of canonical declared types. Nothing else is ever
/// produced by normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclType {
    Integer,
    Real,
    Text,
    Blob,
    Numeric,
}

const ALL: [DeclType; 5] = [
    DeclType::Integer,
    DeclType::Real,
    DeclType::Text,
    DeclType::Blob,
    DeclType::Numeric,
];

impl DeclType {
    /// The canonical spelling, a static string callers may retain for
    /// program lifetime.
    pub fn as_str(self) -> &'static str {
        match self {
            DeclType::Integer => "INTEGER",
            DeclType::Real => "REAL",
            DeclType::Text => "TEXT",
            DeclType::Blob => "BLOB",
            DeclType::Numeric => "NUMERIC",
        }
    }

    /// Normalize a declared type string as the underlying database reports
    /// it. Rules are applied in order; the first match wins.
    pub fn from_declared(declared: &str) -> DeclType {
        // Host schema annotation, e.g. "DT_INTEGER(8)". Case-sensitive.
        if declared.starts_with("DT_INTEGER") {
            return DeclType::Integer;
        }
        // No native boolean storage class; stored as integer.
        if declared.eq_ignore_ascii_case("boolean") {
            return DeclType::Integer;
        }
        for tag in ALL {
            if declared.eq_ignore_ascii_case(tag.as_str()) {
                return tag;
            }
        }
        DeclType::Text
    }
}

impl fmt::Display for DeclType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Option-preserving form: absent in, absent out.
pub fn normalize(declared: Option<&str>) -> Option<&'static str> {
    declared.map(|d| DeclType::from_declared(d).as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_annotation_prefix() {
        assert_eq!(DeclType::from_declared("DT_INTEGER(8)"), DeclType::Integer);
        assert_eq!(DeclType::from_declared("DT_INTEGER"), DeclType::Integer);
        // The prefix match is case-sensitive; lowercase falls through to
        // the default.
        assert_eq!(DeclType::from_declared("dt_integer(8)"), DeclType::Text);
    }

    #[test]
    fn test_boolean_maps_to_integer() {
        assert_eq!(DeclType::from_declared("boolean"), DeclType::Integer);
        assert_eq!(DeclType::from_declared("BOOLEAN"), DeclType::Integer);
        assert_eq!(DeclType::from_declared("Boolean"), DeclType::Integer);
    }

    #[test]
    fn test_canonical_tags_round_trip() {
        for (s, t) in [
            ("INTEGER", DeclType::Integer),
            ("real", DeclType::Real),
            ("text", DeclType::Text),
            ("Blob", DeclType::Blob),
            ("numeric", DeclType::Numeric),
        ] {
            assert_eq!(DeclType::from_declared(s), t);
        }
    }

    #[test]
    fn test_unknown_defaults_to_text() {
        assert_eq!(DeclType::from_declared("CUSTOM"), DeclType::Text);
        assert_eq!(DeclType::from_declared(""), DeclType::Text);
        assert_eq!(DeclType::from_declared("varchar(255)"), DeclType::Text);
    }

    #[test]
    fn test_normalize_absent() {
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(Some("boolean")), Some("INTEGER"));
    }

    #[test]
    fn test_closed_range() {
        let canonical = ["INTEGER", "REAL", "TEXT", "BLOB", "NUMERIC"];
        for input in ["CUSTOM", "DT_INTEGER(8)", "boolean", "blob", "", "datetime"] {
            let out = DeclType::from_declared(input).as_str();
            assert!(canonical.contains(&out), "unexpected tag {out}");
        }
    }
}
