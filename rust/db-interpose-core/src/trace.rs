//! Bounded call-stack capture.
//!
//! Frames are captured and symbolized up front, then folded into the
//! single-line form the log sink expects. Symbolization is best-effort;
//! unresolved frames keep their raw instruction pointer.

/// Capture depth cap.
pub const MAX_STACK_FRAMES: usize = 64;

/// Capture up to [`MAX_STACK_FRAMES`] frames of the current call stack as
/// short display strings. An empty result means capture failed; callers
/// log without a trace.
pub fn capture() -> Vec<String> {
    let mut frames = Vec::new();
    backtrace::trace(|frame| {
        let ip = frame.ip();
        let mut entry = String::new();
        backtrace::resolve(ip, |symbol| {
            if entry.is_empty() {
                if let Some(name) = symbol.name() {
                    entry = readable_symbol(&name.to_string());
                }
            }
        });
        if entry.is_empty() {
            entry = format!("{ip:p}");
        }
        frames.push(entry);
        frames.len() < MAX_STACK_FRAMES
    });
    frames
}

/// C++ frames come back mangled from the resolver; run them through the
/// ABI demangler when it is available.
fn readable_symbol(raw: &str) -> String {
    #[cfg(unix)]
    if raw.starts_with("_Z") {
        if let Some(demangled) = crate::demangle::demangle(raw) {
            return demangled;
        }
    }
    raw.to_string()
}

/// Fold frames into one log-record field.
pub fn format_frames(frames: &[String]) -> String {
    frames.join(" <- ")
}
