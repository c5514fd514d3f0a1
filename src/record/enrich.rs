//! Merging ambient context into an event.

use std::collections::BTreeMap;

use crate::context::store::current_context;
use crate::record::event::LogEvent;
use crate::value::ContextValue;

/// Field names owned by the record itself. Context and extras of the same
/// name never override these.
pub const RESERVED_FIELDS: &[&str] = &[
    "message",
    "severity",
    "timestamp",
    "filename",
    "lineno",
    "thread",
    "pid",
    "exc_info",
];

/// A log event plus the context snapshot taken at emission time.
#[derive(Debug, Clone)]
pub struct EnrichedRecord {
    pub event: LogEvent,
    pub context: BTreeMap<String, ContextValue>,
}

impl EnrichedRecord {
    /// Context and extras flattened into one map: extras override context,
    /// reserved names are dropped. This is everything a renderer appends
    /// beyond the native fields.
    pub fn merged_extras(&self) -> BTreeMap<String, ContextValue> {
        let mut merged = self.context.clone();
        for (k, v) in &self.event.extras {
            merged.insert(k.clone(), v.clone());
        }
        merged.retain(|k, _| !RESERVED_FIELDS.contains(&k.as_str()));
        merged
    }
}

/// Snapshot the current context and pair it with the event.
pub fn enrich(event: LogEvent) -> EnrichedRecord {
    EnrichedRecord {
        context: current_context(),
        event,
    }
}
