//! Severity scale and the raw log event.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::value::ContextValue;

/// The seven standard severities, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Notice = 3,
    Warning = 4,
    Error = 5,
    Critical = 6,
}

impl Severity {
    /// External-facing severity name, uppercase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Notice => "NOTICE",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Coarsest `log` filter that still lets this severity through.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Severity::Trace => log::LevelFilter::Trace,
            Severity::Debug => log::LevelFilter::Debug,
            Severity::Info | Severity::Notice => log::LevelFilter::Info,
            Severity::Warning => log::LevelFilter::Warn,
            Severity::Error | Severity::Critical => log::LevelFilter::Error,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Severity {
        match raw {
            0 => Severity::Trace,
            1 => Severity::Debug,
            2 => Severity::Info,
            3 => Severity::Notice,
            4 => Severity::Warning,
            6 => Severity::Critical,
            _ => Severity::Error,
        }
    }
}

impl From<log::Level> for Severity {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Severity::Error,
            log::Level::Warn => Severity::Warning,
            log::Level::Info => Severity::Info,
            log::Level::Debug => Severity::Debug,
            log::Level::Trace => Severity::Trace,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One emission: message, severity, source location, timestamp, process and
/// thread identifiers, and caller-supplied extras.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    /// Source file basename.
    pub filename: Option<String>,
    pub lineno: Option<u32>,
    /// Module path of the emitting code.
    pub target: String,
    pub thread: String,
    pub pid: u32,
    pub extras: BTreeMap<String, ContextValue>,
    /// Formatted stack detail, present on fallback-handler records.
    pub exc_info: Option<String>,
}

impl LogEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
            timestamp: Utc::now(),
            filename: None,
            lineno: None,
            target: String::new(),
            thread: thread_id_repr(),
            pid: std::process::id(),
            extras: BTreeMap::new(),
            exc_info: None,
        }
    }

    pub fn with_location(mut self, file: &str, line: u32) -> Self {
        self.filename = Some(basename(file));
        self.lineno = Some(line);
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn with_exc_info(mut self, exc_info: impl Into<String>) -> Self {
        self.exc_info = Some(exc_info.into());
        self
    }

    /// Translate a `log` facade record, lifting structured kv pairs into
    /// extras.
    pub fn from_log_record(record: &log::Record<'_>) -> Self {
        let mut event = LogEvent::new(record.level().into(), record.args().to_string())
            .with_target(record.target());
        if let Some(file) = record.file() {
            event.filename = Some(basename(file));
        }
        event.lineno = record.line();

        let mut collector = ExtraCollector(&mut event.extras);
        // A kv pair that cannot be visited is dropped rather than failing
        // the emission.
        let _ = record.key_values().visit(&mut collector);
        event
    }
}

struct ExtraCollector<'a>(&'a mut BTreeMap<String, ContextValue>);

impl<'kvs> log::kv::VisitSource<'kvs> for ExtraCollector<'_> {
    fn visit_pair(
        &mut self,
        key: log::kv::Key<'kvs>,
        value: log::kv::Value<'kvs>,
    ) -> Result<(), log::kv::Error> {
        let converted = match serde_json::to_value(&value) {
            Ok(v) => ContextValue::Json(v),
            Err(_) => ContextValue::String(value.to_string()),
        };
        self.0.insert(key.as_str().to_owned(), converted);
        Ok(())
    }
}

// ThreadId exposes no stable numeric accessor; its Debug form is
// "ThreadId(<n>)". Keep the number and drop the wrapper.
fn thread_id_repr() -> String {
    let raw = format!("{:?}", std::thread::current().id());
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        raw
    } else {
        digits
    }
}

fn basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_names_are_uppercase() {
        assert_eq!(Severity::Info.as_str(), "INFO");
        assert_eq!(Severity::Warning.as_str(), "WARNING");
        assert_eq!(Severity::Critical.as_str(), "CRITICAL");
    }

    #[test]
    fn severity_order_matches_verbosity() {
        assert!(Severity::Trace < Severity::Debug);
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn log_levels_map_onto_severities() {
        assert_eq!(Severity::from(log::Level::Warn), Severity::Warning);
        assert_eq!(Severity::from(log::Level::Trace), Severity::Trace);
    }

    #[test]
    fn location_is_reduced_to_basename() {
        let event = LogEvent::new(Severity::Info, "x").with_location("src/record/event.rs", 42);
        assert_eq!(event.filename.as_deref(), Some("event.rs"));
        assert_eq!(event.lineno, Some(42));
    }

    #[test]
    fn events_carry_process_and_thread_identity() {
        let event = LogEvent::new(Severity::Info, "x");
        assert_eq!(event.pid, std::process::id());
        assert!(!event.thread.is_empty());
        assert!(
            event.thread.chars().all(|c| c.is_ascii_digit()),
            "thread field is not a bare number: {}",
            event.thread
        );
    }
}
