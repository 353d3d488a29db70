//! # Trampoline
//!
//! A queue plus a run loop that executes on whichever thread first schedules
//! onto an idle trampoline. Work scheduled while the loop is running (from
//! inside an action or from another thread) is enqueued and picked up by the
//! running loop, which turns recursion into iteration.
//!
//! ```text
//! schedule ─► enqueue ─► loop running? ── yes ─► return
//!                             │
//!                             no
//!                             ▼
//!             ┌──► head due? ── no ─► wait on condvar until due (or new work)
//!             │        │
//!             │       yes ─► pop ─► invoke ─┐
//!             └─────────────────────────────┘   queue empty ─► idle, return
//! ```
//!
//! Future due times block the running thread; do not schedule timeouts here.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use super::{PriorityQueue, ScheduledAction, ScheduledItem, Scheduler, Timestamp};
use crate::disposables::DisposableRef;
use crate::error::RxError;

#[derive(Default)]
struct State {
    queue: PriorityQueue,
    running: bool,
}

/// Queue and run loop shared by [`TrampolineScheduler`] and `CurrentThreadScheduler`.
#[derive(Default)]
pub struct Trampoline {
    state: Mutex<State>,
    wakeup: Condvar,
}

/// Resets the trampoline to idle if an action unwinds out of the run loop.
struct RunGuard<'a> {
    trampoline: &'a Trampoline,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut state = self.trampoline.state.lock();
            state.running = false;
            state.queue.clear();
        }
    }
}

impl Trampoline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no run loop is active.
    #[must_use]
    pub fn idle(&self) -> bool {
        !self.state.lock().running
    }

    /// Enqueues `item`; drains the queue on this thread if the trampoline was idle.
    pub fn run(&self, item: ScheduledItem, scheduler: &dyn Scheduler) {
        {
            let mut state = self.state.lock();
            state.queue.enqueue(item);
            self.wakeup.notify_all();
            if state.running {
                return;
            }
            state.running = true;
        }
        let _guard = RunGuard { trampoline: self };
        self.drain(scheduler);
    }

    fn drain(&self, scheduler: &dyn Scheduler) {
        while let Some(item) = self.next_due(scheduler) {
            if item.is_cancelled() {
                continue;
            }
            if let Err(err) = item.invoke(scheduler) {
                tracing::error!(error = %err, label = err.as_label(), "trampoline action failed");
            }
        }
    }

    /// Pops the head once due, waiting for it if needed. On an empty queue
    /// the loop goes idle under the same lock and `None` is returned.
    fn next_due(&self, scheduler: &dyn Scheduler) -> Option<ScheduledItem> {
        let mut state = self.state.lock();
        loop {
            let Some(due) = state.queue.peek_duetime() else {
                state.running = false;
                return None;
            };
            let now = scheduler.now();
            if due <= now {
                return state.queue.dequeue();
            }
            let wait = due.saturating_duration_since(now);
            self.wakeup.wait_for(&mut state, wait);
        }
    }
}

/// Scheduler that runs work on a trampoline owned by this instance.
///
/// The first call on an idle instance runs the loop on the calling thread and
/// returns once the queue is empty.
#[derive(Clone, Default)]
pub struct TrampolineScheduler {
    trampoline: Arc<Trampoline>,
}

impl TrampolineScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when a call would start a new run loop (nothing is running).
    #[must_use]
    pub fn schedule_required(&self) -> bool {
        self.trampoline.idle()
    }

    /// Runs `action` through the trampoline if one must be started, inline otherwise.
    pub fn ensure_trampoline(&self, action: ScheduledAction) -> Result<DisposableRef, RxError> {
        ensure_on(&self.trampoline, self, action)
    }
}

impl Scheduler for TrampolineScheduler {
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
        Ok(enqueue_on(&self.trampoline, self, duetime, action))
    }
}

pub(super) fn enqueue_on(
    trampoline: &Trampoline,
    scheduler: &dyn Scheduler,
    duetime: Timestamp,
    action: ScheduledAction,
) -> DisposableRef {
    if duetime > scheduler.now() {
        tracing::warn!("Do not schedule blocking work!");
    }
    let item = ScheduledItem::new(duetime, action);
    let handle = item.disposable();
    trampoline.run(item, scheduler);
    handle
}

pub(super) fn ensure_on(
    trampoline: &Trampoline,
    scheduler: &dyn Scheduler,
    action: ScheduledAction,
) -> Result<DisposableRef, RxError> {
    if trampoline.idle() {
        Ok(enqueue_on(trampoline, scheduler, scheduler.now(), action))
    } else {
        super::invoke_action(scheduler, action)
    }
}
