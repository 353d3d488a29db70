use std::sync::atomic::{AtomicBool, Ordering};

use super::{Disposable, DisposableRef};
use crate::scheduler::SchedulerRef;

/// Disposes its inner disposable on a given scheduler instead of inline.
///
/// Used when a resource must be released on the thread that owns it.
pub struct ScheduledDisposable {
    scheduler: SchedulerRef,
    inner: DisposableRef,
    disposed: AtomicBool,
}

impl ScheduledDisposable {
    #[must_use]
    pub fn new(scheduler: SchedulerRef, inner: DisposableRef) -> Self {
        Self {
            scheduler,
            inner,
            disposed: AtomicBool::new(false),
        }
    }
}

impl Disposable for ScheduledDisposable {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let inner = self.inner.clone();
        let scheduled = self.scheduler.schedule(Box::new(move |_| {
            inner.dispose();
            Ok(None)
        }));
        if let Err(err) = scheduled {
            tracing::warn!(error = %err, "scheduled disposal rejected; disposing inline");
            self.inner.dispose();
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}
