//! # EventLoopScheduler
//!
//! One dedicated worker thread, created lazily by the first `schedule*` call.
//!
//! ```text
//! schedule ─► lock ─► disposed? ─► Err(Disposed)
//!                 ├─► ensure worker thread
//!                 ├─► due now?  ─► ready list (FIFO fast path)
//!                 │   else      ─► priority queue
//!                 └─► notify condvar
//!
//! worker loop:
//!   ├─► move due queue items + ready list into a local batch (due-time order)
//!   ├─► run the batch outside the lock (stop early if disposed)
//!   └─► wait: until next due time │ until notified │ exit if empty (exit_if_empty)
//! ```
//!
//! ## Rules
//! - Items run one at a time, in due-time order, ties FIFO.
//! - `dispose()` stops the worker after the item it is running; later
//!   `schedule*` calls fail with [`RxError::Disposed`].
//! - With `exit_if_empty` the worker exits once the queue drains; the next
//!   `schedule*` call spawns a fresh worker.
//! - The worker keeps the scheduler alive; call `dispose()` to stop a
//!   long-lived loop.
//! - Action errors and panics are logged; the loop keeps running.
//! - Disposing a handle counts a cancellation. Once cancellations reach half
//!   of the pending items, cancelled items are purged from the queue, so a
//!   loop that mostly cancels its timers does not grow.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use super::{
    PriorityQueue, ScheduledAction, ScheduledItem, Scheduler, StdThreadFactory, ThreadFactory,
    Timestamp,
};
use crate::config::Config;
use crate::disposables::{self, CompositeDisposable, Disposable, DisposableRef};
use crate::error::RxError;

#[derive(Default)]
struct LoopState {
    queue: PriorityQueue,
    ready: VecDeque<ScheduledItem>,
    has_thread: bool,
    disposed: bool,
    cancelled: usize,
}

impl LoopState {
    /// Records one cancelled handle; purges once they make up half the backlog.
    fn note_cancelled(&mut self) -> Vec<ScheduledItem> {
        self.cancelled += 1;
        if self.cancelled * 2 < self.queue.len() + self.ready.len() {
            return Vec::new();
        }
        self.cancelled = 0;
        let mut purged = self.queue.purge_cancelled();
        let (dead, live): (VecDeque<_>, VecDeque<_>) =
            std::mem::take(&mut self.ready).into_iter().partition(ScheduledItem::is_cancelled);
        self.ready = live;
        purged.extend(dead);
        purged
    }
}

struct Inner {
    state: Mutex<LoopState>,
    wakeup: Condvar,
    exit_if_empty: bool,
    thread_name: String,
    factory: Arc<dyn ThreadFactory>,
}

/// Scheduler running all work on one dedicated thread.
#[derive(Clone)]
pub struct EventLoopScheduler {
    inner: Arc<Inner>,
}

impl Default for EventLoopScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoopScheduler {
    /// Long-lived event loop with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    #[must_use]
    pub fn with_config(cfg: &Config) -> Self {
        Self::with_factory(cfg, Arc::new(StdThreadFactory))
    }

    /// Event loop whose worker is started by `factory`.
    #[must_use]
    pub fn with_factory(cfg: &Config, factory: Arc<dyn ThreadFactory>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(LoopState::default()),
                wakeup: Condvar::new(),
                exit_if_empty: cfg.exit_if_empty,
                thread_name: cfg.thread_name.clone(),
                factory,
            }),
        }
    }

    /// Whether a worker thread is currently alive.
    #[must_use]
    pub fn has_thread(&self) -> bool {
        self.inner.state.lock().has_thread
    }

    /// Items waiting in the loop (ready list plus priority queue).
    #[must_use]
    pub fn pending(&self) -> usize {
        let state = self.inner.state.lock();
        state.ready.len() + state.queue.len()
    }

    fn ensure_thread(&self, state: &mut LoopState) -> Result<(), RxError> {
        if state.has_thread {
            return Ok(());
        }
        let worker = self.clone();
        self.inner
            .factory
            .spawn(&self.inner.thread_name, Box::new(move || worker.run()))?;
        state.has_thread = true;
        tracing::debug!(thread = %self.inner.thread_name, "event loop worker started");
        Ok(())
    }

    fn run(self) {
        let mut batch: VecDeque<ScheduledItem> = VecDeque::new();
        loop {
            {
                let mut state = self.inner.state.lock();
                if state.disposed {
                    state.has_thread = false;
                    return;
                }
                let now = self.now();
                while let Some(due) = state.queue.peek_duetime() {
                    while state.ready.front().is_some_and(|r| r.duetime() < due) {
                        if let Some(r) = state.ready.pop_front() {
                            batch.push_back(r);
                        }
                    }
                    if due > now {
                        break;
                    }
                    if let Some(item) = state.queue.dequeue() {
                        batch.push_back(item);
                    }
                }
                batch.extend(state.ready.drain(..));
            }

            while let Some(item) = batch.pop_front() {
                if self.inner.state.lock().disposed {
                    batch.clear();
                    break;
                }
                self.invoke(item);
            }

            let mut state = self.inner.state.lock();
            if state.disposed || !state.ready.is_empty() {
                continue;
            }
            match state.queue.peek_duetime() {
                Some(due) => {
                    let now = self.now();
                    if due > now {
                        let wait = due.saturating_duration_since(now);
                        self.inner.wakeup.wait_for(&mut state, wait);
                    }
                }
                None if self.inner.exit_if_empty => {
                    state.has_thread = false;
                    tracing::debug!(thread = %self.inner.thread_name, "event loop drained; worker exits");
                    return;
                }
                None => {
                    self.inner.wakeup.wait(&mut state);
                }
            }
        }
    }

    fn invoke(&self, item: ScheduledItem) {
        if item.is_cancelled() {
            return;
        }
        match catch_unwind(AssertUnwindSafe(|| item.invoke(self))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::error!(error = %err, label = err.as_label(), "event loop action failed");
            }
            Err(payload) => {
                let err = RxError::from_panic(payload.as_ref());
                tracing::error!(error = %err, "event loop action panicked");
            }
        }
    }
}

impl Scheduler for EventLoopScheduler {
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
        let item = ScheduledItem::new(duetime, action);
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let purge = disposables::from_fn(move || {
            if let Some(inner) = weak.upgrade() {
                let purged = inner.state.lock().note_cancelled();
                if !purged.is_empty() {
                    tracing::debug!(purged = purged.len(), "event loop dropped cancelled items");
                }
            }
        });
        let handle: DisposableRef = Arc::new(CompositeDisposable::from_vec(vec![item.disposable(), purge]));

        let mut state = self.inner.state.lock();
        if state.disposed {
            return Err(RxError::Disposed);
        }
        self.ensure_thread(&mut state)?;
        if duetime <= self.now() {
            state.ready.push_back(item);
        } else {
            state.queue.enqueue(item);
        }
        self.inner.wakeup.notify_one();
        Ok(handle)
    }
}

impl Disposable for EventLoopScheduler {
    fn dispose(&self) {
        let (ready, queue) = {
            let mut state = self.inner.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            self.inner.wakeup.notify_all();
            (
                std::mem::take(&mut state.ready),
                std::mem::take(&mut state.queue),
            )
        };
        drop(ready);
        drop(queue);
    }

    fn is_disposed(&self) -> bool {
        self.inner.state.lock().disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SchedulerExt;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Instant;

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_runs_on_one_dedicated_thread_in_order() {
        let el = EventLoopScheduler::new();
        let (tx, rx) = mpsc::channel();

        for (i, delay) in [(2u32, 20u64), (0, 0), (1, 10)] {
            let tx = tx.clone();
            el.schedule_relative_fn(Duration::from_millis(delay), move |_| {
                let _ = tx.send((i, thread::current().id()));
                Ok(None)
            })
            .expect("schedule");
        }

        let got: Vec<_> = (0..3)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).expect("item ran"))
            .collect();
        assert_eq!(got.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(got.iter().all(|(_, id)| *id == got[0].1), "single worker thread");
        assert_ne!(got[0].1, thread::current().id());
        el.dispose();
    }

    #[test]
    fn test_exit_if_empty_resurrects() {
        let cfg = Config {
            exit_if_empty: true,
            ..Config::default()
        };
        let el = EventLoopScheduler::with_config(&cfg);
        let (tx, rx) = mpsc::channel();

        let t = tx.clone();
        el.schedule_fn(move |_| {
            let _ = t.send(1);
            Ok(None)
        })
        .expect("schedule");
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(1));
        assert!(wait_until(|| !el.has_thread()), "worker should exit after drain");

        el.schedule_fn(move |_| {
            let _ = tx.send(2);
            Ok(None)
        })
        .expect("schedule after drain");
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(2));
    }

    #[test]
    fn test_schedule_after_dispose_fails() {
        let el = EventLoopScheduler::new();
        el.dispose();
        assert!(el.is_disposed());
        assert!(matches!(el.schedule_fn(|_| Ok(None)), Err(RxError::Disposed)));
    }

    #[test]
    fn test_dispose_stops_worker() {
        let el = EventLoopScheduler::new();
        let (tx, rx) = mpsc::channel();
        el.schedule_fn(move |_| {
            let _ = tx.send(());
            Ok(None)
        })
        .expect("schedule");
        rx.recv_timeout(Duration::from_secs(5)).expect("ran");
        el.dispose();
        assert!(wait_until(|| !el.has_thread()));
    }

    #[test]
    fn test_cancelled_item_is_skipped() {
        let el = EventLoopScheduler::new();
        let (tx, rx) = mpsc::channel();

        let t = tx.clone();
        let handle = el
            .schedule_relative_fn(Duration::from_millis(50), move |_| {
                let _ = t.send("cancelled");
                Ok(None)
            })
            .expect("schedule");
        handle.dispose();
        el.schedule_relative_fn(Duration::from_millis(80), move |_| {
            let _ = tx.send("kept");
            Ok(None)
        })
        .expect("schedule");

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok("kept"));
        el.dispose();
    }

    #[test]
    fn test_cancelled_timers_are_purged() {
        let el = EventLoopScheduler::new();
        let handles: Vec<_> = (0..10_000)
            .map(|_| {
                el.schedule_relative_fn(Duration::from_secs(3600), |_| Ok(None))
                    .expect("schedule")
            })
            .collect();
        assert_eq!(el.pending(), 10_000);

        for handle in &handles {
            handle.dispose();
        }
        assert_eq!(el.pending(), 0, "cancelled items released before their due time");

        let kept = el
            .schedule_relative_fn(Duration::from_secs(3600), |_| Ok(None))
            .expect("schedule");
        assert_eq!(el.pending(), 1);
        kept.dispose();
        el.dispose();
    }

    #[test]
    fn test_panicking_action_does_not_kill_loop() {
        let el = EventLoopScheduler::new();
        let (tx, rx) = mpsc::channel();
        el.schedule_fn(|_| panic!("action blew up")).expect("schedule");
        el.schedule_fn(move |_| {
            let _ = tx.send(());
            Ok(None)
        })
        .expect("schedule");
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
        el.dispose();
    }
}
