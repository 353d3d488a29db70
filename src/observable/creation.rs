use std::sync::Arc;

use super::Observable;
use crate::disposables::{self, BooleanDisposable, Disposable, DisposableRef};
use crate::error::RxError;
use crate::observers::ObserverRef;
use crate::scheduler::{CurrentThreadScheduler, ScheduledAction, Scheduler, SchedulerRef};

/// Schedules `action` on `scheduler`, or on the current-thread trampoline.
fn schedule_on(scheduler: Option<&SchedulerRef>, action: ScheduledAction) -> Result<DisposableRef, RxError> {
    match scheduler {
        Some(scheduler) => scheduler.schedule(action),
        None => CurrentThreadScheduler::singleton().schedule(action),
    }
}

/// The emission loop of `of`: one scheduled action delivers every value,
/// checking for cancellation before each one.
fn emit_all<T>(items: Arc<Vec<T>>, observer: ObserverRef<T>, cancel: Arc<BooleanDisposable>) -> ScheduledAction
where
    T: Clone + Send + Sync + 'static,
{
    Box::new(move |_: &dyn Scheduler| {
        for value in items.iter() {
            if cancel.is_disposed() {
                return Ok(None);
            }
            observer.on_next(value.clone());
        }
        if !cancel.is_disposed() {
            observer.on_completed();
        }
        Ok(None)
    })
}

impl<T> Observable<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Cold sequence emitting `values` in order, then completing.
    ///
    /// The values go out from a single action on the subscription's
    /// scheduler (current-thread trampoline by default). Disposing the
    /// subscription from inside `on_next` stops the sequence before the
    /// next value, and the stack stays flat on inline schedulers.
    #[must_use]
    pub fn of(values: Vec<T>) -> Self {
        let items = Arc::new(values);
        Observable::create(move |observer, scheduler| {
            let cancel = Arc::new(BooleanDisposable::new());
            let first = emit_all(Arc::clone(&items), Arc::clone(&observer), Arc::clone(&cancel));
            match schedule_on(scheduler, first) {
                Ok(handle) => disposables::from_fn(move || {
                    cancel.dispose();
                    handle.dispose();
                }),
                Err(err) => {
                    observer.on_error(err);
                    disposables::empty()
                }
            }
        })
    }
}

impl<T: Send + 'static> Observable<T> {
    /// Sequence that completes without emitting.
    #[must_use]
    pub fn empty() -> Self {
        Observable::create(|observer, scheduler| {
            let target = Arc::clone(&observer);
            schedule_on(
                scheduler,
                Box::new(move |_| {
                    target.on_completed();
                    Ok(None)
                }),
            )
            .unwrap_or_else(|err| {
                observer.on_error(err);
                disposables::empty()
            })
        })
    }

    /// Sequence that never emits and never terminates.
    #[must_use]
    pub fn never() -> Self {
        Observable::create(|_, _| disposables::empty())
    }

    /// Sequence that fails with `error` without emitting.
    #[must_use]
    pub fn throw(error: RxError) -> Self {
        Observable::create(move |observer, scheduler| {
            let target = Arc::clone(&observer);
            let error = error.clone();
            schedule_on(
                scheduler,
                Box::new(move |_| {
                    target.on_error(error);
                    Ok(None)
                }),
            )
            .unwrap_or_else(|err| {
                observer.on_error(err);
                disposables::empty()
            })
        })
    }
}
