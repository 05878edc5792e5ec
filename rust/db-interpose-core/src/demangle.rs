//! C++ type-name demangling via the platform ABI.
//!
//! `__cxa_demangle` is resolved lazily with `dlsym` so the crate links
//! without libstdc++; in a host that never loaded a C++ runtime the
//! resolver fails once and every call falls back to the mangled name.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::sync::atomic::{AtomicUsize, Ordering};

type CxaDemangleFn =
    unsafe extern "C" fn(*const c_char, *mut c_char, *mut usize, *mut c_int) -> *mut c_char;

const UNRESOLVED: usize = 0;
const UNAVAILABLE: usize = usize::MAX;

static DEMANGLE_FN: AtomicUsize = AtomicUsize::new(UNRESOLVED);

fn demangler() -> Option<CxaDemangleFn> {
    let mut addr = DEMANGLE_FN.load(Ordering::Relaxed);
    if addr == UNRESOLVED {
        let sym = unsafe {
            libc::dlsym(
                libc::RTLD_DEFAULT,
                b"__cxa_demangle\0".as_ptr() as *const c_char,
            )
        };
        addr = if sym.is_null() { UNAVAILABLE } else { sym as usize };
        DEMANGLE_FN.store(addr, Ordering::Relaxed);
    }
    if addr == UNAVAILABLE {
        return None;
    }
    Some(unsafe { std::mem::transmute::<usize, CxaDemangleFn>(addr) })
}

/// Demangle an Itanium ABI symbol name. `None` on any failure; callers
/// fall back to the mangled form.
pub fn demangle(mangled: &str) -> Option<String> {
    let f = demangler()?;
    let input = CString::new(mangled).ok()?;
    let mut status: c_int = 0;
    let out = unsafe { f(input.as_ptr(), std::ptr::null_mut(), std::ptr::null_mut(), &mut status) };
    if out.is_null() {
        return None;
    }
    let result = if status == 0 {
        Some(unsafe { CStr::from_ptr(out) }.to_string_lossy().into_owned())
    } else {
        None
    };
    // The demangler malloc's its output buffer.
    unsafe { libc::free(out as *mut c_void) };
    result
}
