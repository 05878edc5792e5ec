//! Exception log throttling.
//!
//! A pure decision function: given the global throw ordinal, a view of the
//! per-type tracker (if the registry still had room for one), and whether
//! the throw looks shim-related, decide whether to log at all and whether
//! to attach a full stack trace.

/// Per-type log cap for external throws.
pub const MAX_LOGGED_PER_TYPE: u64 = 3;

/// Global log cap for external throws.
pub const MAX_LOGGED_TOTAL: u64 = 50;

/// Read-only view of a tracker at classification time.
#[derive(Debug, Clone, Copy)]
pub struct TrackerView {
    pub count: u64,
    pub logged_with_trace: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub should_log: bool,
    pub attach_trace: bool,
}

/// Classify one throw.
///
/// Shim-related throws are never throttled and always carry a trace.
/// External throws log while both caps hold; a missing tracker (registry
/// full) leaves the throw unthrottled per-type but still capped globally.
/// The trace goes out once per type, the first time the tracker has not
/// been traced yet.
pub fn classify(new_total: u64, tracker: Option<TrackerView>, shim_related: bool) -> Verdict {
    if shim_related {
        return Verdict {
            should_log: true,
            attach_trace: true,
        };
    }
    let should_log = new_total <= MAX_LOGGED_TOTAL
        && tracker.map_or(true, |t| t.count <= MAX_LOGGED_PER_TYPE);
    let attach_trace = should_log && tracker.is_some_and(|t| !t.logged_with_trace);
    Verdict {
        should_log,
        attach_trace,
    }
}
