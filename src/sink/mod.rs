//! Process-wide log sink.
//!
//! # Data Flow
//! ```text
//! log::info! (anywhere in the process)
//!     → Dispatcher (the one registered log::Log)
//!         → EnrichedSink slot (swapped atomically by setup)
//!             → enrich → render → destination
//!         → extra sinks (application-registered, stripped on override)
//! ```
//!
//! # Design Decisions
//! - The dispatcher is registered with the `log` facade exactly once; setup
//!   idempotence comes from swapping the enriched slot, never from touching
//!   unrelated sinks
//! - `ArcSwap` keeps the emit path lock-free
//! - If rendering fails, the raw message and severity still reach the
//!   destination

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use arc_swap::ArcSwapOption;

use crate::record::{enrich, LogEvent, Severity};
use crate::render::{render_plaintext, render_structured};
use crate::setup::SetupError;

/// Where rendered lines go.
#[derive(Clone)]
pub enum LogDestination {
    Stdout,
    Stderr,
    Writer(Arc<Mutex<Box<dyn Write + Send>>>),
}

impl LogDestination {
    /// Send output to an arbitrary writer (used by tests to capture lines).
    pub fn writer(w: impl Write + Send + 'static) -> Self {
        LogDestination::Writer(Arc::new(Mutex::new(Box::new(w))))
    }

    fn write_line(&self, line: &str) {
        // A destination that went away must not take the process down.
        match self {
            LogDestination::Stdout => {
                let stdout = std::io::stdout();
                let mut out = stdout.lock();
                let _ = writeln!(out, "{}", line);
            }
            LogDestination::Stderr => {
                let stderr = std::io::stderr();
                let mut out = stderr.lock();
                let _ = writeln!(out, "{}", line);
            }
            LogDestination::Writer(w) => {
                let mut out = w.lock().unwrap_or_else(PoisonError::into_inner);
                let _ = writeln!(out, "{}", line);
            }
        }
    }
}

impl std::fmt::Debug for LogDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogDestination::Stdout => f.write_str("Stdout"),
            LogDestination::Stderr => f.write_str("Stderr"),
            LogDestination::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// The one sink installed by setup. This is the marker type: re-running
/// setup replaces the previous instance and nothing else.
pub(crate) struct EnrichedSink {
    min_severity: AtomicU8,
    plaintext: bool,
    destination: LogDestination,
}

impl EnrichedSink {
    pub(crate) fn new(min_severity: Severity, plaintext: bool, destination: LogDestination) -> Self {
        Self {
            min_severity: AtomicU8::new(min_severity as u8),
            plaintext,
            destination,
        }
    }

    pub(crate) fn min_severity(&self) -> Severity {
        Severity::from_u8(self.min_severity.load(Ordering::Relaxed))
    }

    // Called by the dispatcher when it drains a signalled level change.
    pub(crate) fn set_min_severity(&self, severity: Severity) {
        self.min_severity.store(severity as u8, Ordering::Relaxed);
    }

    fn submit(&self, event: LogEvent) {
        if event.severity < self.min_severity() {
            return;
        }

        let record = enrich(event);
        let line = if self.plaintext {
            render_plaintext(&record)
        } else {
            render_structured(&record)
        };

        if line.is_empty() {
            // Load-bearing content must never be silently swallowed.
            self.destination.write_line(&format!(
                "{} {}",
                record.event.severity.as_str(),
                record.event.message
            ));
        } else {
            self.destination.write_line(&line);
        }
    }
}

/// Global dispatcher registered with the `log` facade.
pub(crate) struct Dispatcher {
    enriched: ArcSwapOption<EnrichedSink>,
    extra: RwLock<Vec<Box<dyn log::Log>>>,
}

static DISPATCHER: Dispatcher = Dispatcher {
    enriched: ArcSwapOption::const_empty(),
    extra: RwLock::new(Vec::new()),
};

static REGISTERED: AtomicBool = AtomicBool::new(false);

impl Dispatcher {
    fn extra_sinks(&self) -> std::sync::RwLockReadGuard<'_, Vec<Box<dyn log::Log>>> {
        self.extra.read().unwrap_or_else(PoisonError::into_inner)
    }

    // Signal handlers may not touch the sink slot, so level changes arrive
    // through a pending cell applied here, on the emit path.
    fn apply_pending_level(&self) {
        if let Some(severity) = crate::signals::take_pending_level() {
            if let Some(sink) = self.enriched.load_full() {
                sink.set_min_severity(severity);
            }
        }
    }
}

impl log::Log for Dispatcher {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.apply_pending_level();
        let severity = Severity::from(metadata.level());
        if let Some(sink) = self.enriched.load().as_deref() {
            if severity >= sink.min_severity() {
                return true;
            }
        }
        self.extra_sinks().iter().any(|s| s.enabled(metadata))
    }

    fn log(&self, record: &log::Record) {
        self.apply_pending_level();
        if let Some(sink) = self.enriched.load_full() {
            let event = LogEvent::from_log_record(record);
            sink.submit(event);
        }
        for sink in self.extra_sinks().iter() {
            if sink.enabled(record.metadata()) {
                sink.log(record);
            }
        }
    }

    fn flush(&self) {
        for sink in self.extra_sinks().iter() {
            sink.flush();
        }
    }
}

/// Register the dispatcher with the `log` facade, once per process.
///
/// Fails only when a foreign global logger got there first; repeated setup
/// calls after our own registration are fine.
pub(crate) fn ensure_registered() -> Result<(), SetupError> {
    if log::set_logger(&DISPATCHER).is_ok() {
        REGISTERED.store(true, Ordering::SeqCst);
        return Ok(());
    }
    if REGISTERED.load(Ordering::SeqCst) {
        Ok(())
    } else {
        Err(SetupError::LoggerConflict)
    }
}

/// Swap in a freshly configured enriched sink, dropping the previous one.
pub(crate) fn install_enriched(sink: EnrichedSink) {
    DISPATCHER.enriched.store(Some(Arc::new(sink)));
}

pub(crate) fn active_sink() -> Option<Arc<EnrichedSink>> {
    DISPATCHER.enriched.load_full()
}

/// Deliver an event directly to the enriched sink, bypassing the facade.
/// Used by the fallback handler for uncaught panics.
pub(crate) fn submit_event(event: LogEvent) {
    if let Some(sink) = active_sink() {
        sink.submit(event);
    }
}

/// Attach an additional, non-core sink. Kept across setup calls unless
/// setup runs with override enabled.
pub fn add_sink(sink: Box<dyn log::Log>) {
    DISPATCHER
        .extra
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(sink);
}

/// Strip every non-core sink so all records funnel through the enriched
/// sink.
pub(crate) fn clear_extra_sinks() {
    DISPATCHER
        .extra
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}
