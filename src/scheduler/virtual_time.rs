//! # VirtualTimeScheduler
//!
//! Deterministic scheduler whose clock only moves when told to. Work is kept
//! in a priority queue (due time, ties FIFO) and executed on the thread that
//! calls [`start`](VirtualTimeScheduler::start) or
//! [`advance_to`](VirtualTimeScheduler::advance_to).
//!
//! ## Run loop
//! ```text
//! start():
//!   while enabled and queue not empty:
//!     item = pop head
//!     ├─ item.due > clock           ─► clock = item.due, spinning = 0
//!     ├─ spinning > max_spinning    ─► clock += one tick, spinning = 0
//!     └─ otherwise                  ─► run at the current clock
//!     invoke item (unless cancelled); spinning += 1
//!   stop()
//! ```
//!
//! One tick is one second for a tick-driven clock ([`ClockUnit::Ticks`]) and
//! one millisecond for a timestamp-driven one ([`ClockUnit::Timestamp`]).
//!
//! ## Rules
//! - `advance_to(t)` with `t` before the clock fails with `ArgumentOutOfRange`.
//! - `start`/`advance_to` while the loop is already running fail with `ReEntrancy`.
//! - The first action error stops the loop and is returned; the rest of the
//!   queue is kept.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{PriorityQueue, ScheduledAction, ScheduledItem, Scheduler, Timestamp};
use crate::config::Config;
use crate::disposables::DisposableRef;
use crate::error::RxError;

/// How a virtual clock is driven, which fixes the size of one forced tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockUnit {
    /// Float ticks (seconds); a forced tick is one second.
    Ticks,
    /// Timestamps; a forced tick is one millisecond.
    Timestamp,
}

impl ClockUnit {
    fn tick(self) -> Duration {
        match self {
            ClockUnit::Ticks => Duration::from_secs(1),
            ClockUnit::Timestamp => Duration::from_millis(1),
        }
    }
}

struct State {
    clock: Timestamp,
    enabled: bool,
    queue: PriorityQueue,
}

struct Inner {
    state: Mutex<State>,
    unit: ClockUnit,
    max_spinning: u32,
}

/// Resets `enabled` when a run loop ends, including by unwinding.
struct RunGuard<'a> {
    inner: &'a Inner,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.inner.state.lock().enabled = false;
    }
}

/// Scheduler driven by a virtual clock.
#[derive(Clone)]
pub struct VirtualTimeScheduler {
    inner: Arc<Inner>,
}

impl Default for VirtualTimeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualTimeScheduler {
    /// Tick-driven scheduler starting at tick zero.
    #[must_use]
    pub fn new() -> Self {
        Self::from_ticks(0.0)
    }

    /// Tick-driven scheduler starting at `ticks` (seconds).
    #[must_use]
    pub fn from_ticks(ticks: f64) -> Self {
        Self::build(Timestamp::from_secs_f64(ticks), ClockUnit::Ticks, &Config::default())
    }

    /// Timestamp-driven scheduler starting at `initial`.
    #[must_use]
    pub fn with_clock(initial: Timestamp) -> Self {
        Self::build(initial, ClockUnit::Timestamp, &Config::default())
    }

    #[must_use]
    pub fn with_config(initial: Timestamp, unit: ClockUnit, cfg: &Config) -> Self {
        Self::build(initial, unit, cfg)
    }

    fn build(initial: Timestamp, unit: ClockUnit, cfg: &Config) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    clock: initial,
                    enabled: false,
                    queue: PriorityQueue::new(),
                }),
                unit,
                max_spinning: cfg.max_spinning(),
            }),
        }
    }

    /// Current virtual time.
    #[must_use]
    pub fn clock(&self) -> Timestamp {
        self.inner.state.lock().clock
    }

    /// Current virtual time as float ticks.
    #[must_use]
    pub fn ticks(&self) -> f64 {
        self.clock().as_secs_f64()
    }

    #[must_use]
    pub fn unit(&self) -> ClockUnit {
        self.inner.unit
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.state.lock().enabled
    }

    /// Items waiting in the queue, cancelled ones included.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    fn enable(&self) -> Result<RunGuard<'_>, RxError> {
        let mut state = self.inner.state.lock();
        if state.enabled {
            return Err(RxError::ReEntrancy);
        }
        state.enabled = true;
        Ok(RunGuard { inner: &self.inner })
    }

    /// Runs queued work until the queue is empty or [`stop`](Self::stop) is called.
    pub fn start(&self) -> Result<(), RxError> {
        let _guard = self.enable()?;
        let mut spinning: u32 = 0;
        loop {
            let item = {
                let mut state = self.inner.state.lock();
                if !state.enabled {
                    break;
                }
                let Some(item) = state.queue.dequeue() else {
                    break;
                };
                if item.duetime() > state.clock {
                    state.clock = item.duetime();
                    spinning = 0;
                } else if spinning > self.inner.max_spinning {
                    state.clock += self.inner.unit.tick();
                    spinning = 0;
                }
                item
            };
            item.invoke(self)?;
            spinning += 1;
        }
        Ok(())
    }

    /// Stops a running loop at its next check.
    pub fn stop(&self) {
        self.inner.state.lock().enabled = false;
    }

    /// Runs all work due at or before `t`, then sets the clock to `t`.
    pub fn advance_to(&self, t: Timestamp) -> Result<(), RxError> {
        {
            let state = self.inner.state.lock();
            if t < state.clock {
                return Err(RxError::ArgumentOutOfRange {
                    detail: format!(
                        "cannot move virtual clock back from {:?} to {:?}",
                        state.clock.as_duration(),
                        t.as_duration()
                    ),
                });
            }
        }
        let _guard = self.enable()?;
        tracing::debug!(to = ?t.as_duration(), "virtual clock advance");
        loop {
            let item = {
                let mut state = self.inner.state.lock();
                if !state.enabled {
                    break;
                }
                match state.queue.peek_duetime() {
                    Some(due) if due <= t => {
                        if due > state.clock {
                            state.clock = due;
                        }
                        state.queue.dequeue()
                    }
                    _ => break,
                }
            };
            if let Some(item) = item {
                item.invoke(self)?;
            }
        }
        let mut state = self.inner.state.lock();
        if t > state.clock {
            state.clock = t;
        }
        Ok(())
    }

    /// `advance_to(clock + d)`.
    pub fn advance_by(&self, d: Duration) -> Result<(), RxError> {
        let target = self.clock() + d;
        self.advance_to(target)
    }

    /// Moves the clock forward without running any work.
    pub fn sleep(&self, d: Duration) {
        self.inner.state.lock().clock += d;
    }
}

impl Scheduler for VirtualTimeScheduler {
    fn now(&self) -> Timestamp {
        self.clock()
    }

    fn schedule(&self, action: ScheduledAction) -> Result<DisposableRef, RxError> {
        self.schedule_absolute(self.clock(), action)
    }

    fn schedule_relative(
        &self,
        delay: Duration,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        self.schedule_absolute(self.clock() + delay, action)
    }

    fn schedule_absolute(
        &self,
        duetime: Timestamp,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        let item = ScheduledItem::new(duetime, action);
        let handle = item.disposable();
        self.inner.state.lock().queue.enqueue(item);
        Ok(handle)
    }
}
