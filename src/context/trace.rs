//! Trace identifier generation.

use uuid::Uuid;

/// Produce a collision-resistant opaque identifier: 128 random bits as a
/// lowercase hex string.
pub fn generate_trace_id() -> String {
    Uuid::new_v4().simple().to_string()
}
