use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use super::SubjectLike;
use super::hub::{Hub, Terminal, broadcast_next, broadcast_terminal};
use crate::disposables::{self, Disposable, DisposableRef};
use crate::error::RxError;
use crate::observable::Observable;
use crate::observers::{Observer, ObserverRef};
use crate::scheduler::{CurrentThreadScheduler, SchedulerRef, Timestamp};

/// Bounded history of `(arrival time, value)`.
struct Buffer<T> {
    items: VecDeque<(Timestamp, T)>,
    capacity: usize,
    window: Duration,
}

impl<T> Buffer<T> {
    /// Drops entries beyond the capacity or older than the window.
    fn trim(&mut self, now: Timestamp) {
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
        while let Some((at, _)) = self.items.front() {
            if now.saturating_duration_since(*at) <= self.window {
                break;
            }
            self.items.pop_front();
        }
    }
}

/// Subject replaying buffered values to every new subscriber.
///
/// The buffer is bounded by `buffer_size` values and by a `window` of
/// scheduler time; `None` leaves that bound open. A subscriber arriving after
/// the terminal still gets the (trimmed) buffer, then the terminal.
///
/// # Example
/// ```
/// use rxfabric::{Observer, ReplaySubject};
/// use parking_lot::Mutex;
/// use std::sync::Arc;
///
/// let subject = ReplaySubject::with_buffer(2);
/// (1..=3).for_each(|v| subject.on_next(v));
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let s = Arc::clone(&seen);
/// let _sub = subject.as_observable().subscribe_fn(move |v| s.lock().push(v));
/// assert_eq!(*seen.lock(), vec![2, 3]);
/// ```
pub struct ReplaySubject<T> {
    hub: Arc<Hub<T, Buffer<T>>>,
    scheduler: SchedulerRef,
}

impl<T> Clone for ReplaySubject<T> {
    fn clone(&self) -> Self {
        Self {
            hub: Arc::clone(&self.hub),
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}

impl<T: Clone + Send + 'static> ReplaySubject<T> {
    /// Replay subject bounded by count and/or time; `scheduler` supplies the clock.
    #[must_use]
    pub fn new(buffer_size: Option<usize>, window: Option<Duration>, scheduler: SchedulerRef) -> Self {
        Self {
            hub: Hub::new(Buffer {
                items: VecDeque::new(),
                capacity: buffer_size.unwrap_or(usize::MAX),
                window: window.unwrap_or(Duration::MAX),
            }),
            scheduler,
        }
    }

    /// Replays everything.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::new(None, None, Arc::new(CurrentThreadScheduler::singleton()))
    }

    /// Replays the last `buffer_size` values.
    #[must_use]
    pub fn with_buffer(buffer_size: usize) -> Self {
        Self::new(Some(buffer_size), None, Arc::new(CurrentThreadScheduler::singleton()))
    }

    pub fn try_on_next(&self, value: T) -> Result<(), RxError> {
        let now = self.scheduler.now();
        let targets = self.hub.with_live(|s| {
            if s.is_stopped() {
                return Vec::new();
            }
            s.extra.items.push_back((now, value.clone()));
            s.extra.trim(now);
            s.snapshot()
        })?;
        broadcast_next(&targets, &value);
        Ok(())
    }

    pub fn try_on_error(&self, error: RxError) -> Result<(), RxError> {
        self.terminate(Terminal::Failed(error))
    }

    pub fn try_on_completed(&self) -> Result<(), RxError> {
        self.terminate(Terminal::Completed)
    }

    fn terminate(&self, terminal: Terminal) -> Result<(), RxError> {
        let now = self.scheduler.now();
        let targets = self.hub.with_live(|s| {
            if s.is_stopped() {
                return Vec::new();
            }
            s.extra.trim(now);
            s.stop(terminal.clone())
        })?;
        broadcast_terminal(&targets, &terminal);
        Ok(())
    }

    #[must_use]
    pub fn has_observers(&self) -> bool {
        self.hub.has_observers()
    }

    #[must_use]
    pub fn as_observable(&self) -> Observable<T> {
        let hub = Arc::clone(&self.hub);
        let scheduler = Arc::clone(&self.scheduler);
        Observable::create(move |observer, _| subscribe_to(&hub, scheduler.now(), observer))
    }
}

fn subscribe_to<T: Clone + Send + 'static>(
    hub: &Arc<Hub<T, Buffer<T>>>,
    now: Timestamp,
    observer: ObserverRef<T>,
) -> DisposableRef {
    // Replay happens under the lock so live values queue up behind it.
    let guard = hub.lock();
    let (replay, terminal, subscription) = {
        let mut state = guard.borrow_mut();
        if state.disposed {
            (Vec::new(), Some(Terminal::Failed(RxError::Disposed)), None)
        } else {
            state.extra.trim(now);
            let replay: Vec<T> = state.extra.items.iter().map(|(_, v)| v.clone()).collect();
            match state.terminal.clone() {
                Some(terminal) => (replay, Some(terminal), None),
                None => {
                    let (_, subscription) = hub.attach(&mut state, Arc::clone(&observer));
                    (replay, None, Some(subscription))
                }
            }
        }
    };
    for value in replay {
        observer.on_next(value);
    }
    drop(guard);
    if let Some(terminal) = terminal {
        terminal.deliver(observer.as_ref());
    }
    subscription.unwrap_or_else(disposables::empty)
}

impl<T: Clone + Send + 'static> Observer<T> for ReplaySubject<T> {
    fn on_next(&self, value: T) {
        if let Err(err) = self.try_on_next(value) {
            tracing::warn!(label = err.as_label(), "subject dropped on_next: {err}");
        }
    }

    fn on_error(&self, error: RxError) {
        if let Err(err) = self.try_on_error(error) {
            tracing::warn!(label = err.as_label(), "subject dropped on_error: {err}");
        }
    }

    fn on_completed(&self) {
        if let Err(err) = self.try_on_completed() {
            tracing::warn!(label = err.as_label(), "subject dropped on_completed: {err}");
        }
    }
}

impl<T: Clone + Send + 'static> SubjectLike<T> for ReplaySubject<T> {
    fn as_observable(&self) -> Observable<T> {
        ReplaySubject::as_observable(self)
    }
}

impl<T: Send + 'static> Disposable for ReplaySubject<T> {
    fn dispose(&self) {
        self.hub.dispose_with(|buffer| buffer.items.clear());
    }

    fn is_disposed(&self) -> bool {
        self.hub.is_disposed()
    }
}
