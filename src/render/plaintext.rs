//! Human-readable single-line rendering.

use std::fmt::Write as _;

use crate::record::EnrichedRecord;
use crate::value::plain_repr;

/// Render one formatted line:
///
/// ```text
/// <ts> <severity> <file>:<line>:<target>, process=<pid>, thread=<tid>: <msg> [k=v, ...]
/// ```
///
/// The bracketed context suffix is omitted entirely when there is nothing
/// to show.
pub fn render_plaintext(record: &EnrichedRecord) -> String {
    let event = &record.event;

    let mut line = format!(
        "{} {:<7} {}:{}:{}, process={}, thread={}: {}",
        event.timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
        event.severity.as_str(),
        event.filename.as_deref().unwrap_or("unknown"),
        event.lineno.unwrap_or(0),
        event.target,
        event.pid,
        event.thread,
        event.message,
    );

    let merged = record.merged_extras();
    if !merged.is_empty() {
        line.push_str(" [");
        for (i, (key, value)) in merged.iter().enumerate() {
            if i > 0 {
                line.push_str(", ");
            }
            let _ = write!(line, "{}={}", key, plain_repr(value));
        }
        line.push(']');
    }

    if let Some(exc_info) = &event.exc_info {
        line.push('\n');
        line.push_str(exc_info);
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{enrich, EnrichedRecord, LogEvent, Severity};
    use std::collections::BTreeMap;

    fn bare(event: LogEvent) -> EnrichedRecord {
        EnrichedRecord {
            event,
            context: BTreeMap::new(),
        }
    }

    #[test]
    fn line_has_expected_shape() {
        let event = LogEvent::new(Severity::Info, "something happened")
            .with_location("src/render/plaintext.rs", 9)
            .with_target("ctxlog::render");
        let line = render_plaintext(&bare(event));

        assert!(line.contains("INFO"));
        assert!(line.contains("plaintext.rs:9:ctxlog::render"));
        assert!(line.contains(&format!("process={}", std::process::id())));
        assert!(line.contains("thread="));
        assert!(line.ends_with("something happened"));
    }

    #[test]
    fn timestamp_uses_comma_separated_millis() {
        let line = render_plaintext(&bare(LogEvent::new(Severity::Info, "x")));
        // 2019-12-24 12:34:56,123
        let ts = &line[..23];
        assert_eq!(ts.as_bytes()[10], b' ');
        assert_eq!(ts.as_bytes()[19], b',');
        assert!(ts[20..23].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn suffix_is_omitted_when_context_is_empty() {
        let line = render_plaintext(&bare(LogEvent::new(Severity::Info, "plain")));
        assert!(!line.contains(" ["));
    }

    #[test]
    fn suffix_lists_sorted_entries() {
        let event = LogEvent::new(Severity::Info, "msg")
            .with_extra("zeta", 1)
            .with_extra("alpha", "bar");
        let line = render_plaintext(&bare(event));

        assert!(line.ends_with(r#" [alpha="bar", zeta=1]"#));
    }

    #[test]
    fn severity_is_padded_to_seven_chars() {
        let line = render_plaintext(&bare(LogEvent::new(Severity::Info, "x")));
        assert!(line.contains(" INFO    "));
    }

    #[test]
    fn context_values_use_json_repr() {
        let _guard = crate::LogContext::new().with_value("trace_id", 123).enter();
        let line = render_plaintext(&enrich(LogEvent::new(Severity::Info, "x")));
        assert!(line.contains("trace_id=123"));
    }
}
