//! Logging helpers for fallible calls.

use std::fmt;

/// Log-and-pass-through helpers for `Result`.
///
/// The error is logged while the ambient context is still attached, so the
/// emitted record carries the trace identifiers of the failing call chain.
///
/// ```no_run
/// use ctxlog::LogResult;
///
/// fn refresh() -> Result<(), std::io::Error> {
///     # Ok(())
/// }
///
/// // Caller keeps the error:
/// let _ = refresh().log_err();
///
/// // Caller treats the failure as non-fatal:
/// let _ = refresh().log_err_ok();
/// ```
pub trait LogResult<T, E> {
    /// Log the error at ERROR severity, keeping the result intact.
    fn log_err(self) -> Self;

    /// Log the error at ERROR severity and swallow it.
    fn log_err_ok(self) -> Option<T>;
}

impl<T, E: fmt::Display> LogResult<T, E> for Result<T, E> {
    fn log_err(self) -> Self {
        if let Err(e) = &self {
            log::error!("{}", e);
        }
        self
    }

    fn log_err_ok(self) -> Option<T> {
        self.log_err().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_results_pass_through_untouched() {
        let r: Result<i32, String> = Ok(7);
        assert_eq!(r.log_err(), Ok(7));
    }

    #[test]
    fn errors_are_kept_after_logging() {
        let r: Result<(), String> = Err("broken".to_owned());
        assert_eq!(r.log_err(), Err("broken".to_owned()));
    }

    #[test]
    fn swallowed_errors_become_none() {
        let ok: Result<i32, String> = Ok(7);
        let err: Result<i32, String> = Err("broken".to_owned());
        assert_eq!(ok.log_err_ok(), Some(7));
        assert_eq!(err.log_err_ok(), None);
    }
}
