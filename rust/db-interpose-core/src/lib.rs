//! db_interpose core.
//!
//! The engineering core of a preloadable shim that sits between a host
//! process and SQLite, shadowing queries to a remote backend while the
//! host keeps believing it talks to a local file. Three subsystems live
//! here:
//!
//! - SQL compatibility: the [`fts`] rewriter (backed by the [`scan`]
//!   primitives) strips references to FTS virtual tables the shadow does
//!   not have, and [`decltype`] folds declared column types back into the
//!   canonical tags the host's access layer accepts.
//! - Exception observation: the [`observer`] interposes the C++ ABI throw
//!   entry point and drives the [`registry`] and [`throttle`] to log
//!   throws without drowning the host.
//! - Per-thread [`context`]: what the SQLite interposer was doing on this
//!   thread, read back by the classifier.
//!
//! The SQLite interposer itself, the shadow-backend client, and the
//! preload plumbing are external; [`ffi`] is their contract with this
//! crate.

pub mod config;
pub mod context;
pub mod decltype;
pub mod fts;
pub mod logging;
pub mod registry;
pub mod scan;
pub mod throttle;
pub mod trace;

pub mod ffi;

#[cfg(unix)]
pub mod demangle;
#[cfg(unix)]
pub mod observer;
#[cfg(unix)]
pub mod signals;

pub use crate::config::ShimConfig;
pub use crate::context::ContextSnapshot;
pub use crate::decltype::{normalize, DeclType};
pub use crate::fts::rewrite_fts;
pub use crate::registry::ExceptionRegistry;

use std::sync::Once;

static INIT: Once = Once::new();

/// One-shot library initialization: configuration, log sink, fatal-signal
/// handlers. Invoked by the preload plumbing (or the first FFI call);
/// subsequent calls are no-ops.
pub fn init() {
    INIT.call_once(|| {
        let cfg = config::ShimConfig::load();
        if cfg.disabled {
            return;
        }
        logging::init(&cfg);
        #[cfg(unix)]
        signals::install();
        log::info!("db_interpose core initialized");
    });
}
