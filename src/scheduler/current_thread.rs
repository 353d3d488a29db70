use std::sync::Arc;
use std::time::Duration;

use super::trampoline::{enqueue_on, ensure_on};
use super::{ScheduledAction, Scheduler, Timestamp, Trampoline};
use crate::disposables::DisposableRef;
use crate::error::RxError;

thread_local! {
    static TRAMPOLINE: Arc<Trampoline> = Arc::new(Trampoline::new());
}

fn local_trampoline() -> Arc<Trampoline> {
    TRAMPOLINE.with(Arc::clone)
}

/// Trampoline scheduler bound to the calling thread.
///
/// Every thread gets its own trampoline (thread-local, released when the
/// thread ends). The handle is zero-sized: all instances share the calling
/// thread's trampoline, so handing one to another thread makes it schedule
/// onto that thread's queue.
#[derive(Clone, Copy, Debug, Default)]
pub struct CurrentThreadScheduler;

impl CurrentThreadScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn singleton() -> Self {
        Self
    }

    /// True when the calling thread's trampoline is idle.
    #[must_use]
    pub fn schedule_required() -> bool {
        TRAMPOLINE.with(|t| t.idle())
    }

    /// Runs `action` via the calling thread's trampoline if it is idle, inline otherwise.
    pub fn ensure_trampoline(&self, action: ScheduledAction) -> Result<DisposableRef, RxError> {
        ensure_on(&local_trampoline(), self, action)
    }
}

impl Scheduler for CurrentThreadScheduler {
    fn schedule(&self, action: ScheduledAction) -> Result<DisposableRef, RxError> {
        self.schedule_absolute(self.now(), action)
    }

    fn schedule_relative(
        &self,
        delay: Duration,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        self.schedule_absolute(self.now() + delay, action)
    }

    fn schedule_absolute(
        &self,
        duetime: Timestamp,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        Ok(enqueue_on(&local_trampoline(), self, duetime, action))
    }
}
