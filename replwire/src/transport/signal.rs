//! Scoped reset of the interrupt signal disposition around spawning.
//!
//! An ignored SIGINT is inherited across `exec`, so a host that ignores it
//! would hand the shell an uninterruptible session. The guard installs the
//! default disposition and puts the previous one back when dropped, on every
//! exit path.

use std::sync::{Mutex, MutexGuard};

use crate::error::StartupError;

/// Serializes save/restore pairs across drivers in one process.
static DISPOSITION_LOCK: Mutex<()> = Mutex::new(());

/// Holds SIGINT at its default disposition until dropped.
#[must_use = "the previous handler is restored as soon as the guard is dropped"]
pub struct DefaultInterruptGuard {
    #[cfg(unix)]
    previous: nix::sys::signal::SigAction,
    _lock: MutexGuard<'static, ()>,
}

impl DefaultInterruptGuard {
    /// Install the default SIGINT disposition, remembering the current one.
    #[cfg(unix)]
    pub fn acquire() -> Result<Self, StartupError> {
        use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

        let lock = DISPOSITION_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
        // SAFETY: SIG_DFL is not a user handler, so no async-signal-safety
        // requirements apply to installing it.
        let previous = unsafe { sigaction(Signal::SIGINT, &default) }
            .map_err(|e| StartupError::Signal(e.to_string()))?;

        Ok(Self {
            previous,
            _lock: lock,
        })
    }

    /// No-op on platforms without POSIX signals.
    #[cfg(not(unix))]
    pub fn acquire() -> Result<Self, StartupError> {
        let lock = DISPOSITION_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(Self { _lock: lock })
    }
}

impl Drop for DefaultInterruptGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{Signal, sigaction};

            // SAFETY: re-installs exactly the action that was in place when the
            // guard was acquired.
            if let Err(e) = unsafe { sigaction(Signal::SIGINT, &self.previous) } {
                log::warn!("failed to restore SIGINT handler: {}", e);
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

    fn current() -> SigHandler {
        let probe = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
        unsafe {
            let prev = sigaction(Signal::SIGINT, &probe).unwrap();
            sigaction(Signal::SIGINT, &prev).unwrap();
            prev.handler()
        }
    }

    // One test so nothing else in this binary touches SIGINT concurrently.
    #[test]
    fn test_guard_restores_previous_disposition() {
        fn failing_spawn() -> Result<(), StartupError> {
            let _guard = DefaultInterruptGuard::acquire()?;
            assert_eq!(current(), SigHandler::SigDfl);
            Err(StartupError::ExitedEarly)
        }

        let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
        let original = unsafe { sigaction(Signal::SIGINT, &ignore).unwrap() };

        {
            let _guard = DefaultInterruptGuard::acquire().unwrap();
            assert_eq!(current(), SigHandler::SigDfl);
        }
        assert_eq!(current(), SigHandler::SigIgn);

        assert!(failing_spawn().is_err());
        assert_eq!(current(), SigHandler::SigIgn);

        unsafe { sigaction(Signal::SIGINT, &original).unwrap() };
    }
}
