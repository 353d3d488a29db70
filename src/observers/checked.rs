use std::sync::atomic::{AtomicU8, Ordering};

use super::{Observer, ObserverRef};
use crate::error::RxError;

const IDLE: u8 = 0;
const BUSY: u8 = 1;
const DONE: u8 = 2;

/// Observer wrapper that reports grammar violations instead of hiding them.
///
/// - a notification while another one is being delivered is [`RxError::ReEntrancy`];
/// - a notification after a terminal is [`RxError::Completed`].
///
/// The `try_*` methods return these errors. Through the [`Observer`] trait the
/// violation is logged and the notification dropped.
pub struct CheckedObserver<T> {
    observer: ObserverRef<T>,
    state: AtomicU8,
}

impl<T> CheckedObserver<T> {
    #[must_use]
    pub fn new(observer: ObserverRef<T>) -> Self {
        Self {
            observer,
            state: AtomicU8::new(IDLE),
        }
    }

    fn enter(&self) -> Result<(), RxError> {
        match self
            .state
            .compare_exchange(IDLE, BUSY, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(()),
            Err(BUSY) => Err(RxError::ReEntrancy),
            Err(_) => Err(RxError::Completed),
        }
    }

    pub fn try_on_next(&self, value: T) -> Result<(), RxError> {
        self.enter()?;
        self.observer.on_next(value);
        self.state.store(IDLE, Ordering::Release);
        Ok(())
    }

    pub fn try_on_error(&self, error: RxError) -> Result<(), RxError> {
        self.enter()?;
        self.observer.on_error(error);
        self.state.store(DONE, Ordering::Release);
        Ok(())
    }

    pub fn try_on_completed(&self) -> Result<(), RxError> {
        self.enter()?;
        self.observer.on_completed();
        self.state.store(DONE, Ordering::Release);
        Ok(())
    }
}

impl<T> Observer<T> for CheckedObserver<T> {
    fn on_next(&self, value: T) {
        if let Err(err) = self.try_on_next(value) {
            tracing::warn!(label = err.as_label(), "on_next dropped: {err}");
        }
    }

    fn on_error(&self, error: RxError) {
        if let Err(err) = self.try_on_error(error) {
            tracing::warn!(label = err.as_label(), "on_error dropped: {err}");
        }
    }

    fn on_completed(&self) {
        if let Err(err) = self.try_on_completed() {
            tracing::warn!(label = err.as_label(), "on_completed dropped: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observers::AnonymousObserver;
    use parking_lot::Mutex;
    use std::sync::{Arc, OnceLock};

    #[test]
    fn test_after_terminal_is_completed() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let checked = CheckedObserver::new(Arc::new(AnonymousObserver::new(move |v: i32| {
            s.lock().push(v)
        })));

        assert_eq!(checked.try_on_next(1), Ok(()));
        assert_eq!(checked.try_on_completed(), Ok(()));
        assert_eq!(checked.try_on_next(2), Err(RxError::Completed));
        assert_eq!(checked.try_on_error(RxError::Disposed), Err(RxError::Completed));
        assert_eq!(*seen.lock(), vec![1]);
    }

    #[test]
    fn test_reentrant_delivery_is_rejected() {
        let slot: Arc<OnceLock<Arc<CheckedObserver<i32>>>> = Arc::new(OnceLock::new());
        let result = Arc::new(Mutex::new(None));
        let (s, r) = (Arc::clone(&slot), Arc::clone(&result));
        let checked = Arc::new(CheckedObserver::new(Arc::new(AnonymousObserver::new(
            move |v: i32| {
                if v == 1 {
                    let me = s.get().expect("installed");
                    *r.lock() = Some(me.try_on_next(2));
                }
            },
        ))));
        slot.set(Arc::clone(&checked)).ok();

        checked.try_on_next(1).expect("outer delivery");
        assert_eq!(*result.lock(), Some(Err(RxError::ReEntrancy)));
        assert_eq!(checked.try_on_next(3), Ok(()), "idle again after the outer call");
    }
}
