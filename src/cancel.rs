//! Cooperative cancellation
//!
//! SIGINT/SIGTERM raise a flag; the pipeline checks it before starting each
//! irreversible step and refuses to continue. A step already running is never
//! interrupted.

use crate::error::{ProvisionError, Result};
use std::sync::atomic::{AtomicBool, Ordering};

static SIGNALLED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn on_signal(_signum: libc::c_int) {
    SIGNALLED.store(true, Ordering::SeqCst);
}

/// Cancellation flag checked between steps
#[derive(Debug, Clone, Copy)]
pub struct Cancellation {
    flag: &'static AtomicBool,
}

impl Cancellation {
    /// Flag raised by SIGINT/SIGTERM, installing the handlers
    pub fn from_signals() -> Self {
        #[cfg(unix)]
        {
            let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
            // SAFETY: the handler only performs an atomic store, which is async-signal-safe
            unsafe {
                libc::signal(libc::SIGINT, handler);
                libc::signal(libc::SIGTERM, handler);
            }
        }
        Self { flag: &SIGNALLED }
    }

    /// A flag no signal will ever raise
    #[cfg(test)]
    pub fn never() -> Self {
        Self {
            flag: Box::leak(Box::new(AtomicBool::new(false))),
        }
    }

    #[cfg(test)]
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// The raw flag, for callers that poll it themselves
    pub fn flag(&self) -> &'static AtomicBool {
        self.flag
    }

    /// Fail if cancelled, naming the step that will not start
    pub fn check(&self, step: &'static str) -> Result<()> {
        if self.is_cancelled() {
            log::warn!("Cancellation requested, not starting {step}");
            return Err(ProvisionError::Cancelled { step });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_passes_until_cancelled() {
        let cancel = Cancellation::never();
        assert!(cancel.check("download").is_ok());

        cancel.cancel();
        let err = cancel.check("install").unwrap_err();
        assert!(matches!(err, ProvisionError::Cancelled { step: "install" }));
    }

    #[test]
    fn test_independent_flags() {
        let a = Cancellation::never();
        let b = Cancellation::never();
        a.cancel();
        assert!(!b.is_cancelled());
    }
}
