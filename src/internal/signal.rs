//! One-shot latch: a flag plus a condition variable.
//!
//! Used to park a worker until it is told to stop (periodic NewThread
//! loops) and to block a caller until a sequence terminates (`Observable::run`).

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

#[derive(Default)]
pub(crate) struct Signal {
    set: Mutex<bool>,
    cv: Condvar,
}

impl Signal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Raises the flag and wakes every waiter. Idempotent.
    pub(crate) fn set(&self) {
        let mut set = self.set.lock();
        *set = true;
        self.cv.notify_all();
    }

    pub(crate) fn is_set(&self) -> bool {
        *self.set.lock()
    }

    /// Blocks until the flag is raised.
    pub(crate) fn wait(&self) {
        let mut set = self.set.lock();
        while !*set {
            self.cv.wait(&mut set);
        }
    }

    /// Blocks for at most `timeout`; returns whether the flag is raised.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut set = self.set.lock();
        if !*set {
            let _ = self.cv.wait_while_for(&mut set, |set| !*set, timeout);
        }
        *set
    }
}
