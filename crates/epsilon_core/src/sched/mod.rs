//! # Scheduling
//!
//! The phase scheduler hands every registered system's hook to a bounded
//! [`WorkerPool`] and blocks until the whole batch is done.
//!
//! ## Guarantees
//!
//! - Each phase call is synchronous: every hook has returned (or panicked)
//!   before the call returns.
//! - A failing hook never cancels its siblings.
//!
//! ## Non-guarantees
//!
//! - No ordering between systems of the same phase.
//! - No isolation: systems share the world and coordinate themselves.
//! - No timeout: a hook that never returns stalls the phase.

mod pool;

pub(crate) use pool::catch_hook;
pub use pool::WorkerPool;
