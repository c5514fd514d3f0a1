//! Signal-driven runtime level control.
//!
//! # Responsibilities
//! - SIGUSR1 sets the active level to INFO, SIGUSR2 to DEBUG, process-wide
//! - Chain to any previously installed handler instead of replacing it
//!
//! # Design Decisions
//! - Handlers do only async-signal-safe work: relaxed atomic stores into
//!   the pending-level cell and the `log` max-level filter; the dispatcher
//!   applies the pending level on the next emission
//! - A previously installed SIG_DFL/SIG_IGN is not chained, nor is a
//!   three-argument SA_SIGINFO handler; our own handler is never chained
//!   to itself on re-setup

use std::sync::atomic::{AtomicU8, Ordering};

use crate::record::Severity;

const NO_PENDING: u8 = u8::MAX;

// Written by the signal handler, drained by the dispatcher. Keeps the
// handler free of anything that could allocate or drop.
static PENDING_LEVEL: AtomicU8 = AtomicU8::new(NO_PENDING);

/// Drain a level change left by a signal, if any. Called on the emit path,
/// where touching the sink is safe.
pub(crate) fn take_pending_level() -> Option<Severity> {
    let raw = PENDING_LEVEL.swap(NO_PENDING, Ordering::Relaxed);
    (raw != NO_PENDING).then(|| Severity::from_u8(raw))
}

/// Discard a level signalled before setup reconfigured the sink.
pub(crate) fn clear_pending_level() {
    PENDING_LEVEL.store(NO_PENDING, Ordering::Relaxed);
}

#[cfg(unix)]
mod imp {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::PENDING_LEVEL;
    use crate::record::Severity;

    static PREV_USR1: AtomicUsize = AtomicUsize::new(libc::SIG_DFL);
    static PREV_USR2: AtomicUsize = AtomicUsize::new(libc::SIG_DFL);

    pub(super) extern "C" fn handle_level_signal(signum: libc::c_int) {
        let (severity, prev) = match signum {
            libc::SIGUSR1 => (Severity::Info, PREV_USR1.load(Ordering::Relaxed)),
            libc::SIGUSR2 => (Severity::Debug, PREV_USR2.load(Ordering::Relaxed)),
            _ => return,
        };

        PENDING_LEVEL.store(severity as u8, Ordering::Relaxed);
        log::set_max_level(severity.to_level_filter());

        if prev != libc::SIG_DFL && prev != libc::SIG_IGN {
            let previous: extern "C" fn(libc::c_int) = unsafe { std::mem::transmute(prev) };
            previous(signum);
        }
    }

    /// Register the two level signals, capturing whatever handler was
    /// installed before so it still runs after the level change.
    pub(crate) fn install_level_signals() {
        for (signum, prev_slot) in [
            (libc::SIGUSR1, &PREV_USR1),
            (libc::SIGUSR2, &PREV_USR2),
        ] {
            let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
            action.sa_sigaction = handle_level_signal as usize;
            unsafe { libc::sigemptyset(&mut action.sa_mask) };

            let mut previous: libc::sigaction = unsafe { std::mem::zeroed() };
            let rc = unsafe { libc::sigaction(signum, &action, &mut previous) };
            if rc != 0 {
                continue;
            }

            if previous.sa_flags & libc::SA_SIGINFO != 0 {
                // A three-argument siginfo handler cannot be invoked
                // through the one-argument shape.
                prev_slot.store(libc::SIG_DFL, Ordering::Relaxed);
            } else if previous.sa_sigaction != handle_level_signal as usize {
                prev_slot.store(previous.sa_sigaction, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(not(unix))]
mod imp {
    pub(crate) fn install_level_signals() {}
}

pub(crate) use imp::install_level_signals;

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    // One test body: the pending cell is process-global.
    #[test]
    fn pending_level_is_drained_once_and_clearable() {
        clear_pending_level();
        imp::handle_level_signal(libc::SIGUSR1);
        assert_eq!(take_pending_level(), Some(Severity::Info));
        assert_eq!(take_pending_level(), None);

        imp::handle_level_signal(libc::SIGUSR2);
        clear_pending_level();
        assert_eq!(take_pending_level(), None);
    }
}
