//! Fatal-signal backtraces.
//!
//! One analyzed trace per crash, then the default disposition is restored
//! and the signal re-raised so the host still dies the way it would have.
//! SIGABRT is deliberately left alone; assert/abort in the host is often
//! legitimate.

use nix::sys::signal::{self, SigHandler, Signal};

use crate::trace;

const FATAL_SIGNALS: [Signal; 4] = [
    Signal::SIGSEGV,
    Signal::SIGBUS,
    Signal::SIGFPE,
    Signal::SIGILL,
];

/// Install the crash handlers. Failures are ignored; a host that blocks
/// handler installation just loses the diagnostic.
pub fn install() {
    for sig in FATAL_SIGNALS {
        unsafe {
            let _ = signal::signal(sig, SigHandler::Handler(on_fatal_signal));
        }
    }
}

extern "C" fn on_fatal_signal(raw: i32) {
    let name = Signal::try_from(raw)
        .map(Signal::as_str)
        .unwrap_or("UNKNOWN");
    let frames = trace::capture();
    if frames.is_empty() {
        log::error!("fatal signal {name} (trace unavailable)");
    } else {
        log::error!("fatal signal {name} trace=[{}]", trace::format_frames(&frames));
    }

    // Restore default disposition and re-raise for the real crash.
    if let Ok(sig) = Signal::try_from(raw) {
        unsafe {
            let _ = signal::signal(sig, SigHandler::SigDfl);
        }
        let _ = signal::raise(sig);
    }
}
