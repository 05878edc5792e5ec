//! Per-thread shim context.
//!
//! The SQLite interposer records what it was doing on the current thread;
//! the exception classifier reads it back to decide whether a throw looks
//! shim-related. The context is advisory only: it never changes how a
//! statement runs, just how a throw is reported.

use std::cell::{Cell, RefCell};

/// Point-in-time copy of the current thread's context.
#[derive(Debug, Default, Clone)]
pub struct ContextSnapshot {
    pub value_type_calls: u64,
    pub column_type_calls: u64,
    pub last_query: Option<String>,
    pub last_column: Option<String>,
}

impl ContextSnapshot {
    /// A throw is shim-related when this thread inspected a value or
    /// column type, or has a remembered query. The last-accessed column is
    /// context for the log line only and does not flip this decision.
    pub fn is_shim_related(&self) -> bool {
        self.value_type_calls > 0 || self.column_type_calls > 0 || self.last_query.is_some()
    }
}

#[derive(Default)]
struct ShimContext {
    value_type_calls: Cell<u64>,
    column_type_calls: Cell<u64>,
    last_query: RefCell<Option<String>>,
    last_column: RefCell<Option<String>>,
}

thread_local! {
    static CONTEXT: ShimContext = ShimContext::default();
}

/// Remember the statement most recently prepared on this thread.
pub fn note_prepared_sql(sql: &str) {
    CONTEXT.with(|c| *c.last_query.borrow_mut() = Some(sql.to_string()));
}

/// Remember the column most recently accessed on this thread.
pub fn note_column_access(column: &str) {
    CONTEXT.with(|c| *c.last_column.borrow_mut() = Some(column.to_string()));
}

/// Count one declared-column-type lookup.
pub fn note_column_type_call() {
    CONTEXT.with(|c| c.column_type_calls.set(c.column_type_calls.get() + 1));
}

/// Count one runtime-value-type lookup.
pub fn note_value_type_call() {
    CONTEXT.with(|c| c.value_type_calls.set(c.value_type_calls.get() + 1));
}

/// Clear everything recorded on this thread.
pub fn reset() {
    CONTEXT.with(|c| {
        c.value_type_calls.set(0);
        c.column_type_calls.set(0);
        *c.last_query.borrow_mut() = None;
        *c.last_column.borrow_mut() = None;
    });
}

pub fn snapshot() -> ContextSnapshot {
    CONTEXT.with(|c| ContextSnapshot {
        value_type_calls: c.value_type_calls.get(),
        column_type_calls: c.column_type_calls.get(),
        last_query: c.last_query.borrow().clone(),
        last_column: c.last_column.borrow().clone(),
    })
}
