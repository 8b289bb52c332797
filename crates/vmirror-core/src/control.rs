//! Cooperative stop for long-running stages.
//!
//! A `StopSignal` is shared between the Ctrl-C listener and every stage loop.
//! Stages check it at item boundaries: the item in flight finishes, nothing new
//! starts, and whatever was already committed to the manifests stays on disk.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Exit status for a run abandoned by a second interrupt (128 + SIGINT).
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// What an interrupt means given the signal's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// First interrupt: finish the current item, start nothing new.
    Stop,
    /// A stop was already pending: give up on the item in flight.
    Abort,
}

#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Records an interrupt and reports whether it is the first one.
    pub fn interrupt(&self) -> Interrupt {
        if self.stopped.swap(true, Ordering::Relaxed) {
            Interrupt::Abort
        } else {
            Interrupt::Stop
        }
    }

    /// Spawns a task that requests a stop on the first Ctrl-C and exits the
    /// process on the second. The task stays subscribed for the whole run, so
    /// the default SIGINT behaviour is never left disabled.
    pub fn listen_for_ctrl_c(&self) {
        let signal = self.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                match signal.interrupt() {
                    Interrupt::Stop => {
                        tracing::warn!("stop requested, finishing the current item (Ctrl-C again to abort)");
                    }
                    Interrupt::Abort => {
                        tracing::error!("second interrupt, aborting");
                        std::process::exit(INTERRUPTED_EXIT_CODE);
                    }
                }
            }
        });
    }
}
