//! C++ throw observation.
//!
//! This module interposes `__cxa_throw`. When the shim is preloaded, the
//! dynamic linker binds every C++ throw in the host to [`__cxa_throw`]
//! below; the observer extracts the exception's type name from its
//! descriptor, consults the per-thread shim context and the process-wide
//! registry, emits (or suppresses) one log record, and hands the throw to
//! the next handler in the chain untouched. The observer never unwinds,
//! never aborts the throw, and never raises.

use std::borrow::Cow;
use std::cell::Cell;
use std::ffi::CStr;
use std::os::raw::{c_char, c_void};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{context, demangle, registry, throttle, trace};

type CxaThrowFn =
    unsafe extern "C" fn(*mut c_void, *mut c_void, Option<unsafe extern "C" fn(*mut c_void)>);

const UNRESOLVED: usize = 0;
const UNAVAILABLE: usize = usize::MAX;

/// Previously bound `__cxa_throw`, resolved once via RTLD_NEXT.
static CHAINED_HANDLER: AtomicUsize = AtomicUsize::new(UNRESOLVED);

thread_local! {
    /// Guards against a throw raised by the observer's own call path
    /// (demangler, resolver, sink) re-entering observation.
    static IN_OBSERVER: Cell<bool> = const { Cell::new(false) };
}

fn chained_handler() -> Option<CxaThrowFn> {
    let mut addr = CHAINED_HANDLER.load(Ordering::Relaxed);
    if addr == UNRESOLVED {
        let sym = unsafe {
            libc::dlsym(libc::RTLD_NEXT, b"__cxa_throw\0".as_ptr() as *const c_char)
        };
        addr = if sym.is_null() { UNAVAILABLE } else { sym as usize };
        CHAINED_HANDLER.store(addr, Ordering::Relaxed);
    }
    if addr == UNAVAILABLE {
        return None;
    }
    Some(unsafe { std::mem::transmute::<usize, CxaThrowFn>(addr) })
}

/// Extract the mangled type name from an Itanium ABI type descriptor:
/// `std::type_info` lays out as `{ vtable ptr, const char *name }`, so the
/// name sits in the second pointer-sized slot. The returned `Cow` borrows
/// the descriptor's own bytes when they are valid UTF-8, avoiding an
/// allocation on the throw path.
unsafe fn descriptor_type_name(tinfo: *mut c_void) -> Cow<'static, str> {
    if tinfo.is_null() {
        return Cow::Borrowed("unknown");
    }
    let name_ptr = *(tinfo as *const *const c_char).add(1);
    if name_ptr.is_null() {
        return Cow::Borrowed("unknown");
    }
    CStr::from_ptr(name_ptr).to_string_lossy()
}

/// The trace portion of a log record. Every record carries either the
/// trace itself or the literal token `(trace suppressed)`; a failed
/// capture uses the same token as a throttled one.
fn trace_field(attach_trace: bool) -> String {
    if attach_trace {
        let frames = trace::capture();
        if !frames.is_empty() {
            return format!("trace=[{}]", trace::format_frames(&frames));
        }
    }
    "(trace suppressed)".to_string()
}

fn truncated(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Observe one throw: account for it, classify it, and emit at most one
/// log record. Every failure path degrades silently.
fn observe_throw(tinfo: *mut c_void) {
    let mangled = unsafe { descriptor_type_name(tinfo) };

    let ctx = context::snapshot();
    let shim_related = ctx.is_shim_related();
    let obs = registry::global().record(&mangled, shim_related);

    if obs.verdict.should_log {
        let readable =
            demangle::demangle(&mangled).unwrap_or_else(|| mangled.to_string());
        let origin = if shim_related {
            format!(
                "shim-related (column_type={}, value_type={})",
                ctx.column_type_calls, ctx.value_type_calls
            )
        } else {
            "external".to_string()
        };
        let query = match &ctx.last_query {
            Some(q) => format!(" query=\"{}\"", truncated(q, 60)),
            None => String::new(),
        };
        let column = match &ctx.last_column {
            Some(c) => format!(" column=\"{c}\""),
            None => String::new(),
        };
        let trace_field = trace_field(obs.verdict.attach_trace);
        log::error!(
            "exception #{} type=\"{}\" origin={}{}{} {}",
            obs.new_total,
            readable,
            origin,
            query,
            column,
            trace_field
        );
    } else if obs.new_total == throttle::MAX_LOGGED_TOTAL + 1 {
        log::error!(
            "exception logging throttled (>{} total); per-type summary follows",
            throttle::MAX_LOGGED_TOTAL
        );
        for (name, count) in registry::global().summary() {
            let readable = demangle::demangle(&name).unwrap_or(name);
            log::error!("  {readable}: {count} occurrences");
        }
    }
}

/// Replacement for the C++ ABI throw entry point.
///
/// # Safety
///
/// Called by compiler-generated throw sequences with a live exception
/// object and its type descriptor; only the dynamic linker should bind
/// calls to this symbol.
#[no_mangle]
pub unsafe extern "C" fn __cxa_throw(
    thrown: *mut c_void,
    tinfo: *mut c_void,
    dest: Option<unsafe extern "C" fn(*mut c_void)>,
) -> ! {
    let reentered = IN_OBSERVER.with(|flag| flag.replace(true));
    if !reentered {
        // The in-flight exception must survive whatever goes wrong during
        // observation.
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| observe_throw(tinfo)));
        IN_OBSERVER.with(|flag| flag.set(false));
    }

    if let Some(next) = chained_handler() {
        next(thrown, tinfo, dest);
    }
    // The real handler does not return; reaching this point means the
    // chain is broken and unwinding cannot proceed.
    std::process::abort()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_descriptor_is_unknown() {
        let name = unsafe { descriptor_type_name(std::ptr::null_mut()) };
        assert_eq!(name, "unknown");
    }

    #[test]
    fn test_descriptor_second_slot_holds_name() {
        // Lay a fake descriptor out the way the Itanium ABI does.
        let mangled = b"13fake_exception\0";
        let fake: [*const c_char; 2] = [
            std::ptr::null(),
            mangled.as_ptr() as *const c_char,
        ];
        let name = unsafe { descriptor_type_name(fake.as_ptr() as *mut c_void) };
        assert_eq!(name, "13fake_exception");
    }

    #[test]
    fn test_descriptor_null_name_slot() {
        let fake: [*const c_char; 2] = [std::ptr::null(), std::ptr::null()];
        let name = unsafe { descriptor_type_name(fake.as_ptr() as *mut c_void) };
        assert_eq!(name, "unknown");
    }

    #[test]
    fn test_trace_field_always_yields_trace_or_token() {
        assert_eq!(trace_field(false), "(trace suppressed)");
        // With capture requested the field is either a real trace or the
        // same literal token; nothing else ever reaches a record.
        let attached = trace_field(true);
        assert!(
            attached.starts_with("trace=[") || attached == "(trace suppressed)",
            "got: {attached}"
        );
    }

    #[test]
    fn test_truncated_respects_char_boundaries() {
        assert_eq!(truncated("abcdef", 3), "abc");
        assert_eq!(truncated("ab", 3), "ab");
        assert_eq!(truncated("déjà vu déjà", 4), "déjà");
    }

    #[test]
    fn test_observe_throw_never_panics() {
        // Null descriptor, empty context, no logger installed: the whole
        // path must degrade silently.
        context::reset();
        observe_throw(std::ptr::null_mut());
    }
}
