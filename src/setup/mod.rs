//! Idempotent logging setup.
//!
//! # Responsibilities
//! - Register the process-wide dispatcher and configure the enriched sink
//! - Resolve plaintext/override settings: explicit argument first, then
//!   environment
//! - Reset the default context, then seed it with the build identifier
//! - Install the uncaught-panic fallback handler
//! - Install the runtime level signals last, after sinks exist
//!
//! # Design Decisions
//! - Calling setup twice swaps the enriched sink; one emission renders one
//!   line, never two
//! - The panic hook is installed once per process and chains to the hook
//!   that was there before

use std::backtrace::Backtrace;
use std::sync::Once;

use thiserror::Error;

use crate::context::store::{reset_defaults, set_default};
use crate::record::{LogEvent, Severity};
use crate::signals::{clear_pending_level, install_level_signals};
use crate::sink::{self, EnrichedSink, LogDestination};

/// Environment variable selecting plaintext output. Truthy tokens: `1`,
/// `true`, `t`, case-insensitive; anything else (including unset) is falsy.
pub const PLAINTEXT_ENV: &str = "CTXLOG_PLAINTEXT_LOGS";

/// Environment variable controlling sink override. Same tokens; unset
/// defaults to truthy.
pub const OVERRIDE_ENV: &str = "CTXLOG_OVERRIDE_LOGGERS";

/// Environment variable supplying a build/commit identifier. Ignored when
/// absent, empty, or the literal placeholder `unknown`.
pub const COMMIT_ID_ENV: &str = "GIT_COMMIT_ID";

/// Errors surfaced to the caller of setup.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("a different global logger is already installed")]
    LoggerConflict,
}

/// Builder for logging setup.
///
/// ```no_run
/// use ctxlog::{LogSetup, Severity};
///
/// LogSetup::new()
///     .min_level(Severity::Debug)
///     .plaintext(true)
///     .install()
///     .expect("logging setup failed");
/// ```
#[derive(Debug, Default)]
pub struct LogSetup {
    min_level: Option<Severity>,
    plaintext: Option<bool>,
    destination: Option<LogDestination>,
    override_sinks: Option<bool>,
}

impl LogSetup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimal severity to output at. Defaults to INFO.
    pub fn min_level(mut self, level: Severity) -> Self {
        self.min_level = Some(level);
        self
    }

    /// Force plaintext (true) or structured (false) output, bypassing the
    /// environment.
    pub fn plaintext(mut self, plaintext: bool) -> Self {
        self.plaintext = Some(plaintext);
        self
    }

    /// Send output somewhere other than the default stream (stdout for
    /// structured, stderr for plaintext).
    pub fn destination(mut self, destination: LogDestination) -> Self {
        self.destination = Some(destination);
        self
    }

    /// Control whether non-core sinks are stripped so that every record
    /// funnels through the enriched sink.
    pub fn override_sinks(mut self, override_sinks: bool) -> Self {
        self.override_sinks = Some(override_sinks);
        self
    }

    /// Wire everything up. Safe to call repeatedly; each call replaces the
    /// sink the previous call installed and nothing else.
    pub fn install(self) -> Result<(), SetupError> {
        let min_level = self.min_level.unwrap_or(Severity::Info);
        let plaintext = self
            .plaintext
            .or_else(|| env_truthy(PLAINTEXT_ENV))
            .unwrap_or(false);
        let override_sinks = self
            .override_sinks
            .or_else(|| env_truthy(OVERRIDE_ENV))
            .unwrap_or(true);

        sink::ensure_registered()?;

        reset_defaults();
        if let Ok(commit_id) = std::env::var(COMMIT_ID_ENV) {
            if !commit_id.is_empty() && commit_id != "unknown" {
                set_default("git_commit_id", commit_id);
            }
        }

        let destination = self.destination.unwrap_or(if plaintext {
            LogDestination::Stderr
        } else {
            LogDestination::Stdout
        });

        sink::install_enriched(EnrichedSink::new(min_level, plaintext, destination));
        if override_sinks {
            sink::clear_extra_sinks();
        }
        log::set_max_level(min_level.to_level_filter());
        // A level signalled before this call must not undo the level just
        // configured.
        clear_pending_level();

        install_panic_hook();
        install_level_signals();

        Ok(())
    }
}

/// Set up logging with defaults: structured output to stdout at INFO,
/// settings resolved from the environment.
pub fn setup_logging() -> Result<(), SetupError> {
    LogSetup::new().install()
}

static PANIC_HOOK: Once = Once::new();

/// Log uncaught panics at error severity with full stack detail, then let
/// the previously installed hook proceed unchanged.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let payload = payload_str(info.payload());
            let mut event = LogEvent::new(
                Severity::Error,
                format!("Uncaught panic: {}", payload),
            );
            if let Some(location) = info.location() {
                event = event
                    .with_location(location.file(), location.line())
                    .with_target("panic");
            }
            let backtrace = Backtrace::force_capture();
            event = event.with_exc_info(format!("{}\n{}", info, backtrace));
            sink::submit_event(event);

            previous(info);
        }));
    });
}

fn payload_str(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic payload>"
    }
}

fn env_truthy(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "t"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_tokens_are_recognized_case_insensitively() {
        std::env::set_var("CTXLOG_TEST_TRUTHY", "TRUE");
        assert_eq!(env_truthy("CTXLOG_TEST_TRUTHY"), Some(true));
        std::env::set_var("CTXLOG_TEST_TRUTHY", "t");
        assert_eq!(env_truthy("CTXLOG_TEST_TRUTHY"), Some(true));
        std::env::set_var("CTXLOG_TEST_TRUTHY", "1");
        assert_eq!(env_truthy("CTXLOG_TEST_TRUTHY"), Some(true));
        std::env::remove_var("CTXLOG_TEST_TRUTHY");
    }

    #[test]
    fn everything_else_is_falsy() {
        std::env::set_var("CTXLOG_TEST_FALSY", "yes");
        assert_eq!(env_truthy("CTXLOG_TEST_FALSY"), Some(false));
        std::env::set_var("CTXLOG_TEST_FALSY", "0");
        assert_eq!(env_truthy("CTXLOG_TEST_FALSY"), Some(false));
        std::env::remove_var("CTXLOG_TEST_FALSY");
        assert_eq!(env_truthy("CTXLOG_TEST_FALSY"), None);
    }
}
