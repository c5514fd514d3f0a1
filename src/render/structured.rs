//! Machine-parseable JSON-per-line rendering.

use chrono::SecondsFormat;
use serde_json::Value;

use crate::record::EnrichedRecord;
use crate::value::canonicalize;

/// Render one JSON object: context and extras flattened at top level,
/// native fields written last so they always win.
pub fn render_structured(record: &EnrichedRecord) -> String {
    let mut fields = serde_json::Map::new();

    for (key, value) in record.merged_extras() {
        fields.insert(key, canonicalize(&value));
    }

    let event = &record.event;
    fields.insert("message".to_owned(), Value::String(event.message.clone()));
    fields.insert(
        "severity".to_owned(),
        Value::String(event.severity.as_str().to_owned()),
    );
    fields.insert(
        "timestamp".to_owned(),
        Value::String(
            event
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Micros, true),
        ),
    );
    if let Some(filename) = &event.filename {
        fields.insert("filename".to_owned(), Value::String(filename.clone()));
    }
    if let Some(lineno) = event.lineno {
        fields.insert("lineno".to_owned(), Value::from(lineno));
    }
    fields.insert("thread".to_owned(), Value::String(event.thread.clone()));
    fields.insert("pid".to_owned(), Value::from(event.pid));
    if let Some(exc_info) = &event.exc_info {
        fields.insert("exc_info".to_owned(), Value::String(exc_info.clone()));
    }

    Value::Object(fields).to_string()
}
