//! Log events and enrichment.
//!
//! # Data Flow
//! ```text
//! log::info!(foo = "bar"; "msg")
//!     → LogEvent (native fields + extras)
//!     → enrich(): merge in current_context() at emission time
//!     → EnrichedRecord → renderer
//! ```
//!
//! # Design Decisions
//! - Enrichment builds a new record from (native fields, context snapshot,
//!   extras); it never mutates the event in place
//! - Native fields always win over context and extras of the same name;
//!   extras win over context
//! - The context snapshot is taken when the event is emitted, not when the
//!   surrounding scope was entered

pub mod enrich;
pub mod event;

pub use enrich::{enrich, EnrichedRecord, RESERVED_FIELDS};
pub use event::{LogEvent, Severity};
