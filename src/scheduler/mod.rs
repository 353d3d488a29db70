//! # Scheduler family
//!
//! A [`Scheduler`] is an abstraction over time and execution context: it
//! reports `now()` and runs actions immediately, after a delay or at an
//! absolute time. Every `schedule*` call returns a [`DisposableRef`];
//! disposing it before the action starts guarantees the action never runs.
//!
//! ## Instances
//! ```text
//! ImmediateScheduler      inline on the caller; refuses delays (WouldBlock)
//! TrampolineScheduler     inline, queued; one run loop drains recursive work
//! CurrentThreadScheduler  per-thread trampoline singleton
//! EventLoopScheduler      one dedicated worker thread, priority queue + ready list
//! NewThreadScheduler      fresh exit-if-empty event loop per action
//! ThreadPoolScheduler     NewThread whose workers come from a bounded tokio blocking pool
//! TimeoutScheduler        process-wide timers, never inline
//! CatchScheduler          decorator intercepting action errors
//! VirtualTimeScheduler    deterministic clock driven by start/advance_to
//! ```
//!
//! ## Actions
//! An action is a boxed `FnOnce(&dyn Scheduler) -> ActionResult`. It receives
//! the scheduler to use for recursive work (for [`CatchScheduler`] that is a
//! wrapper so recursive work inherits the handler). State is captured by the
//! closure. If the action returns a disposable, the disposable joins the
//! lifetime of the handle returned by `schedule*`.
//!
//! ## Errors
//! - Immediate returns an action's error from the `schedule*` call.
//! - Trampoline, event-loop, thread and timer schedulers log it and move on.
//! - Virtual-time schedulers return it from `start`/`advance_to`.

mod catch;
mod current_thread;
mod event_loop;
mod immediate;
mod item;
mod new_thread;
mod queue;
mod thread_factory;
mod thread_pool;
mod time;
mod timeout;
mod trampoline;
mod virtual_time;

pub use catch::{CatchScheduler, ErrorHandler};
pub use current_thread::CurrentThreadScheduler;
pub use event_loop::EventLoopScheduler;
pub use immediate::ImmediateScheduler;
pub use item::ScheduledItem;
pub use new_thread::NewThreadScheduler;
pub use queue::PriorityQueue;
pub use thread_factory::{StdThreadFactory, ThreadFactory, ThreadWork};
pub use thread_pool::ThreadPoolScheduler;
pub use time::{Timestamp, to_duration, to_seconds};
pub use timeout::TimeoutScheduler;
pub use trampoline::{Trampoline, TrampolineScheduler};
pub use virtual_time::{ClockUnit, VirtualTimeScheduler};

use std::sync::Arc;
use std::time::Duration;

use crate::disposables::{self, Disposable, DisposableRef, MultipleAssignmentDisposable};
use crate::error::RxError;

/// What an action hands back: an optional resource whose lifetime joins the schedule handle.
pub type ActionResult = Result<Option<DisposableRef>, RxError>;

/// A unit of scheduled work.
pub type ScheduledAction = Box<dyn FnOnce(&dyn Scheduler) -> ActionResult + Send + 'static>;

/// Body of a periodic schedule. Returning `Err` stops the repetition.
pub type PeriodicAction = Box<dyn FnMut() -> Result<(), RxError> + Send + 'static>;

/// Shared, type-erased scheduler.
pub type SchedulerRef = Arc<dyn Scheduler>;

/// Abstraction over time and execution context.
pub trait Scheduler: Send + Sync {
    /// The scheduler's notion of current time.
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    /// Schedules `action` to run as soon as possible.
    fn schedule(&self, action: ScheduledAction) -> Result<DisposableRef, RxError>;

    /// Schedules `action` to run after `delay`.
    fn schedule_relative(
        &self,
        delay: Duration,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError>;

    /// Schedules `action` to run at `duetime`.
    fn schedule_absolute(
        &self,
        duetime: Timestamp,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError>;

    /// Runs `action` every `period`.
    ///
    /// The default re-schedules through [`Scheduler::schedule_relative`]: each
    /// run measures its own duration and the next one is due at
    /// `period - elapsed`, clamped to zero. Schedulers with a native periodic
    /// mechanism override it.
    fn schedule_periodic(
        &self,
        period: Duration,
        action: PeriodicAction,
    ) -> Result<DisposableRef, RxError> {
        schedule_periodic_recursive(self, period, action)
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn schedule(&self, action: ScheduledAction) -> Result<DisposableRef, RxError> {
        (**self).schedule(action)
    }

    fn schedule_relative(
        &self,
        delay: Duration,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        (**self).schedule_relative(delay, action)
    }

    fn schedule_absolute(
        &self,
        duetime: Timestamp,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        (**self).schedule_absolute(duetime, action)
    }

    fn schedule_periodic(
        &self,
        period: Duration,
        action: PeriodicAction,
    ) -> Result<DisposableRef, RxError> {
        (**self).schedule_periodic(period, action)
    }
}

/// Closure-taking conveniences over [`Scheduler`].
pub trait SchedulerExt: Scheduler {
    fn schedule_fn<F>(&self, action: F) -> Result<DisposableRef, RxError>
    where
        F: FnOnce(&dyn Scheduler) -> ActionResult + Send + 'static,
    {
        self.schedule(Box::new(action))
    }

    fn schedule_relative_fn<F>(&self, delay: Duration, action: F) -> Result<DisposableRef, RxError>
    where
        F: FnOnce(&dyn Scheduler) -> ActionResult + Send + 'static,
    {
        self.schedule_relative(delay, Box::new(action))
    }

    fn schedule_absolute_fn<F>(
        &self,
        duetime: Timestamp,
        action: F,
    ) -> Result<DisposableRef, RxError>
    where
        F: FnOnce(&dyn Scheduler) -> ActionResult + Send + 'static,
    {
        self.schedule_absolute(duetime, Box::new(action))
    }

    fn schedule_periodic_fn<F>(&self, period: Duration, action: F) -> Result<DisposableRef, RxError>
    where
        F: FnMut() -> Result<(), RxError> + Send + 'static,
    {
        self.schedule_periodic(period, Box::new(action))
    }
}

impl<S: Scheduler + ?Sized> SchedulerExt for S {}

/// Runs `action` and normalises its result to a disposable.
pub fn invoke_action(
    scheduler: &dyn Scheduler,
    action: ScheduledAction,
) -> Result<DisposableRef, RxError> {
    Ok(action(scheduler)?.unwrap_or_else(disposables::empty))
}

/// Periodic scheduling on top of `schedule_relative` recursion.
pub(crate) fn schedule_periodic_recursive<S: Scheduler + ?Sized>(
    scheduler: &S,
    period: Duration,
    action: PeriodicAction,
) -> Result<DisposableRef, RxError> {
    let handle = Arc::new(MultipleAssignmentDisposable::new());
    let first = scheduler.schedule_relative(period, periodic_step(period, action, handle.clone()))?;
    handle.set(first);
    Ok(handle)
}

fn periodic_step(
    period: Duration,
    mut body: PeriodicAction,
    handle: Arc<MultipleAssignmentDisposable>,
) -> ScheduledAction {
    Box::new(move |scheduler| {
        if handle.is_disposed() {
            return Ok(None);
        }
        let started = scheduler.now();
        if let Err(err) = body() {
            handle.dispose();
            return Err(err);
        }
        if handle.is_disposed() {
            return Ok(None);
        }
        let elapsed = scheduler.now().saturating_duration_since(started);
        let next = period.saturating_sub(elapsed);
        let again = scheduler.schedule_relative(next, periodic_step(period, body, handle.clone()))?;
        handle.set(again);
        Ok(None)
    })
}
