//! Record renderers.
//!
//! # Responsibilities
//! - Structured: one self-contained JSON object per event
//! - Plaintext: one human-readable line with a bracketed context suffix
//!
//! # Design Decisions
//! - Both renderers consume the same [`EnrichedRecord`]
//! - Output is deterministic: JSON keys and suffix entries are sorted
//! - A renderer never errors; unrepresentable values degrade to strings

pub mod plaintext;
pub mod structured;

pub use plaintext::render_plaintext;
pub use structured::render_structured;
