//! C ABI surface for the (external) SQLite interposer.
//!
//! The interposer is C; these exports are its whole contract with the
//! core. String outputs follow two ownership rules: rewritten SQL is a
//! fresh allocation released through [`db_interpose_sql_free`] exactly
//! once, and normalized type tags are statically allocated and must never
//! be freed. Null pointers in take the documented "absent" path out.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::decltype::DeclType;
use crate::{context, fts};

unsafe fn borrowed_str<'a>(p: *const c_char) -> Option<&'a str> {
    if p.is_null() {
        return None;
    }
    CStr::from_ptr(p).to_str().ok()
}

/// One-shot library initialization; see [`crate::init`].
#[no_mangle]
pub extern "C" fn db_interpose_init() {
    crate::init();
}

/// Rewrite a statement for the shadow backend. Returns null when no
/// rewrite is required (or on any failure — the caller then uses the
/// original SQL); otherwise a fresh null-terminated string the caller
/// must release with [`db_interpose_sql_free`].
#[no_mangle]
pub unsafe extern "C" fn db_interpose_rewrite_fts(sql: *const c_char) -> *mut c_char {
    let Some(sql) = borrowed_str(sql) else {
        return ptr::null_mut();
    };
    match fts::rewrite_fts(sql) {
        Some(rewritten) => CString::new(rewritten)
            .map(CString::into_raw)
            .unwrap_or(ptr::null_mut()),
        None => ptr::null_mut(),
    }
}

/// Release a string returned by [`db_interpose_rewrite_fts`].
#[no_mangle]
pub unsafe extern "C" fn db_interpose_sql_free(sql: *mut c_char) {
    if !sql.is_null() {
        drop(CString::from_raw(sql));
    }
}

/// Normalize a declared column type to its canonical tag. The result is
/// statically allocated; callers must not free it and may retain it for
/// program lifetime. Null in, null out.
#[no_mangle]
pub unsafe extern "C" fn db_interpose_normalize_decltype(declared: *const c_char) -> *const c_char {
    // `static`, not `const`: callers may compare and retain the address.
    static INTEGER: &[u8] = b"INTEGER\0";
    static REAL: &[u8] = b"REAL\0";
    static TEXT: &[u8] = b"TEXT\0";
    static BLOB: &[u8] = b"BLOB\0";
    static NUMERIC: &[u8] = b"NUMERIC\0";

    let Some(declared) = borrowed_str(declared) else {
        return ptr::null();
    };
    let tag: &[u8] = match DeclType::from_declared(declared) {
        DeclType::Integer => INTEGER,
        DeclType::Real => REAL,
        DeclType::Text => TEXT,
        DeclType::Blob => BLOB,
        DeclType::Numeric => NUMERIC,
    };
    tag.as_ptr() as *const c_char
}

/// Record the statement the interposer just prepared on this thread.
#[no_mangle]
pub unsafe extern "C" fn db_interpose_note_prepared_sql(sql: *const c_char) {
    if let Some(sql) = borrowed_str(sql) {
        context::note_prepared_sql(sql);
    }
}

/// Record the column the interposer is about to hand to the host.
#[no_mangle]
pub unsafe extern "C" fn db_interpose_note_column_access(column: *const c_char) {
    if let Some(column) = borrowed_str(column) {
        context::note_column_access(column);
    }
}

/// Count one declared-column-type lookup on this thread.
#[no_mangle]
pub extern "C" fn db_interpose_note_column_type_call() {
    context::note_column_type_call();
}

/// Count one runtime-value-type lookup on this thread.
#[no_mangle]
pub extern "C" fn db_interpose_note_value_type_call() {
    context::note_value_type_call();
}

/// Clear this thread's shim context.
#[no_mangle]
pub extern "C" fn db_interpose_context_reset() {
    context::reset();
}
