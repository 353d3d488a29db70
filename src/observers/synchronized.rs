use parking_lot::ReentrantMutex;

use super::{Observer, ObserverRef};
use crate::error::RxError;

/// Serialises notifications arriving from several threads.
///
/// Deliveries from different threads never overlap. The lock is reentrant,
/// so an observer that emits into itself from inside a callback proceeds on
/// the same thread instead of deadlocking.
pub struct SynchronizedObserver<T> {
    observer: ObserverRef<T>,
    gate: ReentrantMutex<()>,
}

impl<T> SynchronizedObserver<T> {
    #[must_use]
    pub fn new(observer: ObserverRef<T>) -> Self {
        Self {
            observer,
            gate: ReentrantMutex::new(()),
        }
    }
}

impl<T> Observer<T> for SynchronizedObserver<T> {
    fn on_next(&self, value: T) {
        let _gate = self.gate.lock();
        self.observer.on_next(value);
    }

    fn on_error(&self, error: RxError) {
        let _gate = self.gate.lock();
        self.observer.on_error(error);
    }

    fn on_completed(&self) {
        let _gate = self.gate.lock();
        self.observer.on_completed();
    }
}
