//! Shared utilities for logging integration tests.

use std::io::Write;
use std::sync::{Arc, Mutex};

use ctxlog::LogDestination;

/// Cloneable in-memory destination so tests can read back what the sink
/// wrote.
#[derive(Clone, Default)]
pub struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Capture {
    pub fn destination(&self) -> LogDestination {
        LogDestination::writer(self.clone())
    }

    /// Drain everything written so far.
    pub fn take_output(&self) -> String {
        let mut buf = self.0.lock().unwrap();
        let out = String::from_utf8(std::mem::take(&mut *buf)).unwrap();
        out
    }

    /// Drain and parse one JSON object per non-empty line.
    pub fn take_json_lines(&self) -> Vec<serde_json::Value> {
        self.take_output()
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| serde_json::from_str(l).expect("line is not valid JSON"))
            .collect()
    }

    /// Drain and parse exactly one JSON record.
    #[allow(dead_code)]
    pub fn take_single_json(&self) -> serde_json::Value {
        let mut lines = self.take_json_lines();
        assert_eq!(lines.len(), 1, "expected a single line of logging output");
        lines.remove(0)
    }
}
