//! Interrupt handling
//!
//! SIGINT, SIGTERM and SIGHUP (closing the terminal window) are all caught.
//! The signal handler only records that an interrupt happened. Child
//! processes in the foreground receive the same signal and exit on their own;
//! the provisioning sequence then notices the flag at its next checkpoint and
//! unwinds normally, so cleanup always runs on the main thread.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::debug;

use crate::Error;

/// Shared flag set once the process receives SIGINT, SIGTERM or SIGHUP
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    /// Register the process wide handler for SIGINT, SIGTERM and SIGHUP
    pub fn install() -> Result<Self, Error> {
        let interrupt = Self::default();
        let flag = interrupt.0.clone();

        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })
        .map_err(Error::InterruptHandler)?;
        debug!("Installed interrupt handler");

        Ok(interrupt)
    }

    /// Mark the run as interrupted
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fail with [Error::Interrupted] if an interrupt was received
    pub fn checkpoint(&self) -> Result<(), Error> {
        if self.is_triggered() {
            Err(Error::Interrupted)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        thread,
        time::{Duration, Instant},
    };

    use super::*;

    fn wait_for(interrupt: &Interrupt) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if interrupt.is_triggered() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    // The only test that installs the process wide handler; a second
    // `install` in this binary would fail.
    #[test]
    fn termination_signals_set_the_flag() {
        let interrupt = Interrupt::install().unwrap();

        for signal in [libc::SIGTERM, libc::SIGHUP] {
            interrupt.0.store(false, Ordering::SeqCst);
            // Without a handler for it, the signal would end the test process.
            assert_eq!(unsafe { libc::raise(signal) }, 0);
            assert!(wait_for(&interrupt), "signal {signal} was not caught");
        }
    }

    #[test]
    fn clones_share_the_flag() {
        let interrupt = Interrupt::default();
        let handle = interrupt.clone();

        assert!(interrupt.checkpoint().is_ok());
        handle.trigger();
        assert!(matches!(interrupt.checkpoint(), Err(Error::Interrupted)));
    }
}
