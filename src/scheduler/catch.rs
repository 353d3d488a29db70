//! # CatchScheduler
//!
//! Decorator that intercepts failing actions before they reach the wrapped
//! scheduler. A failure is either an `Err` returned by the action or a panic
//! (converted to [`RxError::Panicked`]). The handler decides:
//!
//! - `true`  → handled; the action counts as finished.
//! - `false` → escalated; the error is returned to the wrapped scheduler,
//!   which applies its own policy (log, return from `schedule`, ...).
//!
//! Actions receive a view of the wrapped scheduler that re-applies the same
//! handler, so recursively scheduled work is covered too. The view borrows
//! the scheduler the action was invoked with and costs nothing to build.
//!
//! Periodic work is delegated to the wrapped scheduler's own
//! `schedule_periodic`. A handled failure stops the periodic action; an
//! escalated one is returned to the wrapped scheduler.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use super::{ActionResult, PeriodicAction, ScheduledAction, Scheduler, SchedulerRef, Timestamp};
use crate::disposables::{Disposable, DisposableRef, SingleAssignmentDisposable};
use crate::error::RxError;

/// Decides whether an action failure is handled (`true`) or escalated (`false`).
pub type ErrorHandler = Arc<dyn Fn(&RxError) -> bool + Send + Sync>;

/// Scheduler decorator routing action failures through a handler.
#[derive(Clone)]
pub struct CatchScheduler {
    inner: SchedulerRef,
    handler: ErrorHandler,
}

impl CatchScheduler {
    #[must_use]
    pub fn new<F>(inner: SchedulerRef, handler: F) -> Self
    where
        F: Fn(&RxError) -> bool + Send + Sync + 'static,
    {
        Self {
            inner,
            handler: Arc::new(handler),
        }
    }

    fn view(&self) -> Guarded<'_> {
        Guarded {
            inner: &*self.inner,
            handler: &self.handler,
        }
    }
}

/// Borrowed wrapper handed to actions; applies the handler to everything it schedules.
struct Guarded<'a> {
    inner: &'a dyn Scheduler,
    handler: &'a ErrorHandler,
}

impl Guarded<'_> {
    fn wrap(&self, action: ScheduledAction) -> ScheduledAction {
        let handler = Arc::clone(self.handler);
        Box::new(move |scheduler: &dyn Scheduler| {
            let recursive = Guarded {
                inner: scheduler,
                handler: &handler,
            };
            let outcome: ActionResult =
                match catch_unwind(AssertUnwindSafe(|| action(&recursive))) {
                    Ok(result) => result,
                    Err(payload) => Err(RxError::from_panic(payload.as_ref())),
                };
            match outcome {
                Ok(d) => Ok(d),
                Err(err) if handler(&err) => {
                    tracing::debug!(error = %err, "action failure handled by catch scheduler");
                    Ok(None)
                }
                Err(err) => Err(err),
            }
        })
    }
}

impl Scheduler for Guarded<'_> {
    fn now(&self) -> Timestamp {
        self.inner.now()
    }

    fn schedule(&self, action: ScheduledAction) -> Result<DisposableRef, RxError> {
        self.inner.schedule(self.wrap(action))
    }

    fn schedule_relative(
        &self,
        delay: Duration,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        self.inner.schedule_relative(delay, self.wrap(action))
    }

    fn schedule_absolute(
        &self,
        duetime: Timestamp,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        self.inner.schedule_absolute(duetime, self.wrap(action))
    }
}

impl Scheduler for CatchScheduler {
    fn now(&self) -> Timestamp {
        self.inner.now()
    }

    fn schedule(&self, action: ScheduledAction) -> Result<DisposableRef, RxError> {
        self.view().schedule(action)
    }

    fn schedule_relative(
        &self,
        delay: Duration,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        self.view().schedule_relative(delay, action)
    }

    fn schedule_absolute(
        &self,
        duetime: Timestamp,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        self.view().schedule_absolute(duetime, action)
    }

    fn schedule_periodic(&self, period: Duration, mut action: PeriodicAction) -> Result<DisposableRef, RxError> {
        let handle = Arc::new(SingleAssignmentDisposable::new());
        let stop = Arc::clone(&handle);
        let handler = Arc::clone(&self.handler);
        let mut failed = false;
        let guarded: PeriodicAction = Box::new(move || {
            if failed {
                return Ok(());
            }
            let outcome = match catch_unwind(AssertUnwindSafe(|| action())) {
                Ok(result) => result,
                Err(payload) => Err(RxError::from_panic(payload.as_ref())),
            };
            let Err(err) = outcome else {
                return Ok(());
            };
            failed = true;
            if !handler(&err) {
                return Err(err);
            }
            tracing::debug!(error = %err, "periodic failure handled by catch scheduler; stopping");
            stop.dispose();
            Ok(())
        });
        let periodic = self.inner.schedule_periodic(period, guarded)?;
        if let Err(err) = handle.set(periodic) {
            tracing::warn!(label = err.as_label(), "periodic handle already assigned");
        }
        Ok(handle as DisposableRef)
    }
}
