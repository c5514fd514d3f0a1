//! Scoped context propagation.
//!
//! # Data Flow
//! ```text
//! Request boundary / call site:
//!     LogContext::new().with_value(..) → enter() → ContextGuard
//!
//! Emission (any depth below the guard):
//!     current_context() → defaults ∪ stack layers (innermost wins)
//!
//! Guard drop:
//!     layer removed → prior bindings visible again
//! ```
//!
//! # Design Decisions
//! - Per-thread layer stack: no locking on the read/write path
//! - Restore is RAII: the guard removes its layer on every exit path,
//!   including panic unwind
//! - Async tasks carry their layers explicitly via `FutureExt`, so bindings
//!   survive resumption on a different worker thread
//! - Only the process-wide default map is shared, behind a mutex

pub mod future;
pub mod store;
pub mod trace;

pub use future::{ContextFuture, FutureExt};
pub use store::{
    current_context, current_value, reset_defaults, set_default, ContextGuard, LogContext,
};
pub use trace::generate_trace_id;
