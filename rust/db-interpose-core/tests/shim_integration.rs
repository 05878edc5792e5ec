//! End-to-end checks across the shim core: the FTS rewrite scenarios, the
//! normalization table, and exception accounting under flood.

use db_interpose::registry::MAX_EXCEPTION_TYPES;
use db_interpose::throttle::{MAX_LOGGED_PER_TYPE, MAX_LOGGED_TOTAL};
use db_interpose::{normalize, rewrite_fts, DeclType, ExceptionRegistry};

fn contains_nocase(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(&needle.to_ascii_lowercase())
}

#[test]
fn test_simple_fts_rewrite_scenario() {
    let sql = "SELECT * FROM m JOIN fts4_metadata_titles ON m.id = fts4_metadata_titles.id WHERE fts4_metadata_titles.title match 'test'";
    let out = rewrite_fts(sql).expect("rewrite expected");
    assert!(out.contains("1=0"), "got: {out}");
    assert!(!contains_nocase(&out, "fts4_metadata_titles"), "got: {out}");
    assert!(!contains_nocase(&out, "match "), "got: {out}");
    assert!(out.len() <= 2 * sql.len() + 100);
}

#[test]
fn test_apostrophe_literal_scenario() {
    let sql = "SELECT * FROM m JOIN fts4_metadata_titles ON m.id = fts4_metadata_titles.id WHERE fts4_metadata_titles.title match 'it''s a test'";
    let out = rewrite_fts(sql).expect("rewrite expected");
    assert!(out.contains("1=0"));
    assert!(!contains_nocase(&out, "match "), "got: {out}");
    assert!(!out.contains('\''), "dangling apostrophe in: {out}");
}

#[test]
fn test_two_names_scenario() {
    let sql = "SELECT * FROM m WHERE fts4_metadata_titles.title match 'O''Brien' OR fts4_tag_titles.tag match 'McDonald''s'";
    let out = rewrite_fts(sql).expect("rewrite expected");
    assert!(out.contains("1=0"));
    assert!(!contains_nocase(&out, "match 'O"), "got: {out}");
    assert!(!contains_nocase(&out, "match 'McDonald"), "got: {out}");
    assert!(!out.contains("1=1"));
}

#[test]
fn test_non_fts_passthrough_scenario() {
    assert_eq!(rewrite_fts("SELECT * FROM metadata_items WHERE id = 1"), None);
}

#[test]
fn test_normalization_table_scenario() {
    assert_eq!(DeclType::from_declared("DT_INTEGER(8)"), DeclType::Integer);
    assert_eq!(DeclType::from_declared("boolean"), DeclType::Integer);
    assert_eq!(DeclType::from_declared("BOOLEAN"), DeclType::Integer);
    assert_eq!(DeclType::from_declared("text"), DeclType::Text);
    assert_eq!(DeclType::from_declared("CUSTOM"), DeclType::Text);
    assert_eq!(normalize(None), None);
}

#[test]
fn test_throttle_flood_scenario() {
    let reg = ExceptionRegistry::new();

    // 55 external throws of one type: exactly MAX_LOGGED_PER_TYPE logged.
    let mut logged = 0;
    for _ in 0..55 {
        if reg.record("St8bad_cast", false).verdict.should_log {
            logged += 1;
        }
    }
    assert_eq!(logged, MAX_LOGGED_PER_TYPE);

    // One shim-related throw still goes out, with a trace.
    let obs = reg.record("St8bad_cast", true);
    assert!(obs.verdict.should_log);
    assert!(obs.verdict.attach_trace);
}

#[test]
fn test_global_cap_across_distinct_types() {
    let reg = ExceptionRegistry::new();
    let mut logged = 0;
    for i in 0..80 {
        let name = format!("9Distinct{i}E");
        if reg.record(&name, false).verdict.should_log {
            logged += 1;
        }
    }
    // Every type is fresh so only the global cap bites.
    assert_eq!(logged, MAX_LOGGED_TOTAL);
}

#[test]
fn test_shim_related_bypass_scenario() {
    let reg = ExceptionRegistry::new();
    for _ in 0..200 {
        assert!(reg.record("N4soci11soci_errorE", true).verdict.should_log);
    }
}

#[test]
fn test_registry_capacity_scenario() {
    let reg = ExceptionRegistry::new();
    let names: Vec<String> = (0..MAX_EXCEPTION_TYPES + 5)
        .map(|i| format!("8Overflow{i}E"))
        .collect();
    let absent = names
        .iter()
        .filter(|name| reg.record(name, false).type_count.is_none())
        .count();
    assert_eq!(absent, 5);
    assert_eq!(reg.tracked_types(), MAX_EXCEPTION_TYPES);
}

#[test]
fn test_tracker_stability_scenario() {
    let reg = ExceptionRegistry::new();
    for expected in 1..=10u64 {
        let obs = reg.record("St12length_error", false);
        assert_eq!(obs.type_count, Some(expected));
    }
}

#[test]
fn test_counter_monotonicity_across_threads() {
    use std::sync::Arc;
    let reg = Arc::new(ExceptionRegistry::new());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let reg = Arc::clone(&reg);
            std::thread::spawn(move || {
                let name = format!("6Thread{t}E");
                (0..250)
                    .map(|_| reg.record(&name, false).new_total)
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    let mut totals: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().expect("thread panicked"))
        .collect();
    totals.sort_unstable();
    totals.dedup();
    assert_eq!(totals.len(), 1000, "duplicate totals observed");
}
