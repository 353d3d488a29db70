use std::cell::RefCell;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::disposables::{Disposable, DisposableRef};
use crate::error::RxError;
use crate::observers::{Observer, ObserverRef};

/// How a subject ended.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Terminal {
    Completed,
    Failed(RxError),
}

impl Terminal {
    pub(crate) fn deliver<T>(&self, observer: &dyn Observer<T>) {
        match self {
            Terminal::Completed => observer.on_completed(),
            Terminal::Failed(err) => observer.on_error(err.clone()),
        }
    }
}

/// A registered subscriber.
pub(crate) struct Entry<T> {
    id: u64,
    observer: ObserverRef<T>,
    active: Arc<AtomicBool>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            observer: Arc::clone(&self.observer),
            active: Arc::clone(&self.active),
        }
    }
}

impl<T> Entry<T> {
    /// Runs `f` unless the subscription was disposed in the meantime.
    pub(crate) fn deliver(&self, f: impl FnOnce(&dyn Observer<T>)) {
        if self.active.load(Ordering::Acquire) {
            f(self.observer.as_ref());
        }
    }
}

/// Mutable part of a subject; `X` is the variant's own state.
pub(crate) struct HubState<T, X> {
    entries: Vec<Entry<T>>,
    next_id: u64,
    pub(crate) terminal: Option<Terminal>,
    pub(crate) disposed: bool,
    pub(crate) extra: X,
}

impl<T, X> HubState<T, X> {
    pub(crate) fn ensure_live(&self) -> Result<(), RxError> {
        if self.disposed {
            return Err(RxError::Disposed);
        }
        Ok(())
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.terminal.is_some()
    }

    pub(crate) fn has_observers(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Subscribers to serve the current notification.
    pub(crate) fn snapshot(&self) -> Vec<Entry<T>> {
        self.entries.clone()
    }

    /// Records `terminal` and hands back the subscribers to notify.
    pub(crate) fn stop(&mut self, terminal: Terminal) -> Vec<Entry<T>> {
        self.terminal = Some(terminal);
        mem::take(&mut self.entries)
    }

    pub(crate) fn dispose(&mut self) -> Vec<Entry<T>> {
        self.disposed = true;
        mem::take(&mut self.entries)
    }
}

/// Shared core of every subject: the subscriber list behind a re-entrant lock.
///
/// The `RefCell` borrow is never held while an observer runs; the lock guard
/// may be (seed and replay delivery), which is why the lock is re-entrant.
pub(crate) struct Hub<T, X> {
    state: ReentrantMutex<RefCell<HubState<T, X>>>,
}

impl<T: Send + 'static, X: Send + 'static> Hub<T, X> {
    pub(crate) fn new(extra: X) -> Arc<Self> {
        Arc::new(Self {
            state: ReentrantMutex::new(RefCell::new(HubState {
                entries: Vec::new(),
                next_id: 0,
                terminal: None,
                disposed: false,
                extra,
            })),
        })
    }

    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, RefCell<HubState<T, X>>> {
        self.state.lock()
    }

    /// Registers `observer`; the returned handle removes it again.
    pub(crate) fn attach(
        self: &Arc<Self>,
        state: &mut HubState<T, X>,
        observer: ObserverRef<T>,
    ) -> (Entry<T>, DisposableRef) {
        let id = state.next_id;
        state.next_id += 1;
        let entry = Entry {
            id,
            observer,
            active: Arc::new(AtomicBool::new(true)),
        };
        state.entries.push(entry.clone());
        let subscription: DisposableRef = Arc::new(InnerSubscription {
            hub: Arc::downgrade(self),
            id,
            active: Arc::clone(&entry.active),
        });
        (entry, subscription)
    }

    /// Runs `f` with the state borrowed, failing with `Disposed` after disposal.
    pub(crate) fn with_live<R>(&self, f: impl FnOnce(&mut HubState<T, X>) -> R) -> Result<R, RxError> {
        let guard = self.lock();
        let mut state = guard.borrow_mut();
        state.ensure_live()?;
        Ok(f(&mut state))
    }

    pub(crate) fn has_observers(&self) -> bool {
        self.lock().borrow().has_observers()
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.lock().borrow().disposed
    }

    /// Marks the subject disposed after `reset` has cleared the variant state.
    pub(crate) fn dispose_with(&self, reset: impl FnOnce(&mut X)) {
        let guard = self.lock();
        let dropped = {
            let mut state = guard.borrow_mut();
            reset(&mut state.extra);
            state.dispose()
        };
        for entry in &dropped {
            entry.active.store(false, Ordering::Release);
        }
    }
}

/// Removes one subscriber from its subject.
struct InnerSubscription<T, X> {
    hub: Weak<Hub<T, X>>,
    id: u64,
    active: Arc<AtomicBool>,
}

impl<T: Send + 'static, X: Send + 'static> Disposable for InnerSubscription<T, X> {
    fn dispose(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(hub) = self.hub.upgrade() {
            let guard = hub.lock();
            guard.borrow_mut().entries.retain(|e| e.id != self.id);
        }
    }

    fn is_disposed(&self) -> bool {
        !self.active.load(Ordering::Acquire)
    }
}

/// Delivers `value` to every still-active entry, in subscription order.
pub(crate) fn broadcast_next<T: Clone>(entries: &[Entry<T>], value: &T) {
    for entry in entries {
        entry.deliver(|o| o.on_next(value.clone()));
    }
}

pub(crate) fn broadcast_terminal<T>(entries: &[Entry<T>], terminal: &Terminal) {
    for entry in entries {
        entry.deliver(|o| terminal.deliver(o));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observers::AnonymousObserver;
    use parking_lot::Mutex;

    #[test]
    fn test_attach_and_remove() {
        let hub = Hub::<i32, ()>::new(());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let observer: ObserverRef<i32> = Arc::new(AnonymousObserver::new(move |v: i32| s.lock().push(v)));

        let (_, sub) = {
            let guard = hub.lock();
            let mut state = guard.borrow_mut();
            hub.attach(&mut state, observer)
        };
        assert!(hub.has_observers());

        let snapshot = hub.lock().borrow().snapshot();
        broadcast_next(&snapshot, &1);
        sub.dispose();
        broadcast_next(&snapshot, &2);

        assert_eq!(*seen.lock(), vec![1], "inactive entry skipped even in an old snapshot");
        assert!(!hub.has_observers());
    }

    #[test]
    fn test_with_live_after_dispose() {
        let hub = Hub::<i32, u8>::new(7);
        hub.dispose_with(|x| *x = 0);
        assert!(hub.is_disposed());
        assert_eq!(hub.with_live(|s| s.extra), Err(RxError::Disposed));
    }

    #[test]
    fn test_subscription_outliving_hub() {
        let hub = Hub::<i32, ()>::new(());
        let (_, sub) = {
            let guard = hub.lock();
            let mut state = guard.borrow_mut();
            hub.attach(&mut state, Arc::new(AnonymousObserver::new(|_: i32| {})))
        };
        drop(hub);
        sub.dispose();
        assert!(sub.is_disposed());
    }
}
