//! Process-wide exception accounting.
//!
//! A fixed-capacity table of per-type trackers behind one mutex, plus a
//! lock-free total counter. Trackers are created on first sight of a type
//! name and never destroyed; once the table is full, unseen names are
//! dropped and the classifier treats the throw as unthrottled-per-type.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::throttle::{self, TrackerView, Verdict};

/// Capacity of the tracker table. Compile-time, not configurable.
pub const MAX_EXCEPTION_TYPES: usize = 64;

struct TypeTracker {
    /// Interned copy of the type name. Matching is byte equality on this
    /// copy only; callers may pass names from any allocation, so no
    /// pointer from a past call can be trusted to still be live.
    name: Box<str>,
    count: u64,
    logged_with_trace: bool,
}

#[derive(Default)]
struct Table {
    trackers: Vec<TypeTracker>,
}

impl Table {
    fn observe(&mut self, name: &str) -> Option<&mut TypeTracker> {
        if let Some(i) = self.trackers.iter().position(|t| *t.name == *name) {
            let tracker = &mut self.trackers[i];
            tracker.count += 1;
            return Some(tracker);
        }
        if self.trackers.len() < MAX_EXCEPTION_TYPES {
            self.trackers.push(TypeTracker {
                name: name.into(),
                count: 1,
                logged_with_trace: false,
            });
            return self.trackers.last_mut();
        }
        None
    }
}

/// Outcome of recording one throw.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    /// This throw's position in the process-wide total order.
    pub new_total: u64,
    pub verdict: Verdict,
    /// Occurrence count for this type, absent when the table was full and
    /// the type unseen.
    pub type_count: Option<u64>,
}

pub struct ExceptionRegistry {
    table: Mutex<Table>,
    total: AtomicU64,
}

impl Default for ExceptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExceptionRegistry {
    pub fn new() -> Self {
        ExceptionRegistry {
            table: Mutex::new(Table::default()),
            total: AtomicU64::new(0),
        }
    }

    /// Total throws observed since program start.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Number of distinct type names currently tracked.
    pub fn tracked_types(&self) -> usize {
        self.lock().trackers.len()
    }

    /// Record one throw of `type_name` and classify it. The per-type count
    /// increment, the classification it feeds, and the trace-flag update
    /// all happen under the registry lock, so two racing throws of the
    /// same type see distinct, monotonic counts.
    pub fn record(&self, type_name: &str, shim_related: bool) -> Observation {
        let new_total = self.total.fetch_add(1, Ordering::Relaxed) + 1;
        let mut table = self.lock();
        let tracker = table.observe(type_name);
        let view = tracker.as_ref().map(|t| TrackerView {
            count: t.count,
            logged_with_trace: t.logged_with_trace,
        });
        let verdict = throttle::classify(new_total, view, shim_related);
        let type_count = view.map(|v| v.count);
        if verdict.attach_trace {
            if let Some(t) = tracker {
                t.logged_with_trace = true;
            }
        }
        Observation {
            new_total,
            verdict,
            type_count,
        }
    }

    /// Per-type occurrence counts, for the one-time summary emitted when
    /// global throttling kicks in.
    pub fn summary(&self) -> Vec<(String, u64)> {
        self.lock()
            .trackers
            .iter()
            .map(|t| (t.name.to_string(), t.count))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Table> {
        // The observer must keep working even if another thread died while
        // holding the lock.
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

lazy_static::lazy_static! {
    static ref GLOBAL: ExceptionRegistry = ExceptionRegistry::new();
}

/// The process-wide registry the observer routes through.
pub fn global() -> &'static ExceptionRegistry {
    &GLOBAL
}
