//! # AutoDetachObserver
//!
//! Every `Observable::subscribe` call wraps the user's observer in this
//! adapter. It owns the subscription's resources and ties their lifetime to
//! the notification grammar.
//!
//! ```text
//! on_next(v)     ─► user.on_next(v)
//!                     └─ panics ─► on_error(Panicked)   (converted, then detached)
//! on_error(e)    ─► user.on_error(e) ─► dispose subscription
//!                     └─ panics ─► dispose subscription, then re-raise
//! on_completed() ─► user.on_completed() ─► dispose subscription
//!                     └─ panics ─► dispose subscription, then re-raise
//! dispose()      ─► stop delivering ─► dispose subscription
//! ```
//!
//! A panic from a terminal handler is re-raised rather than converted: the
//! observer has already seen its terminal and may not receive another.

use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};
use std::sync::atomic::{AtomicBool, Ordering};

use super::{Observer, ObserverRef};
use crate::disposables::{Disposable, DisposableRef, SingleAssignmentDisposable};
use crate::error::RxError;

/// Subscriber adapter enforcing grammar, terminal-detach and auto-detach.
pub struct AutoDetachObserver<T> {
    observer: ObserverRef<T>,
    subscription: SingleAssignmentDisposable,
    stopped: AtomicBool,
}

impl<T> AutoDetachObserver<T> {
    #[must_use]
    pub fn new(observer: ObserverRef<T>) -> Self {
        Self {
            observer,
            subscription: SingleAssignmentDisposable::new(),
            stopped: AtomicBool::new(false),
        }
    }

    /// Attaches the resources acquired by the subscription function.
    ///
    /// If the observer already terminated or was disposed, `subscription` is
    /// disposed on arrival.
    pub fn set_subscription(&self, subscription: DisposableRef) -> Result<(), RxError> {
        self.subscription.set(subscription)
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Delivers `error` unless already stopped; returns whether it was delivered.
    pub fn fail(&self, error: RxError) -> bool {
        if self.is_stopped() {
            return false;
        }
        self.on_error(error);
        true
    }
}

impl<T> Observer<T> for AutoDetachObserver<T> {
    fn on_next(&self, value: T) {
        if self.is_stopped() {
            return;
        }
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| self.observer.on_next(value))) {
            let err = RxError::from_panic(payload.as_ref());
            tracing::debug!(error = %err, "on_next handler panicked; converting to on_error");
            self.on_error(err);
        }
    }

    fn on_error(&self, error: RxError) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        let outcome = catch_unwind(AssertUnwindSafe(|| self.observer.on_error(error)));
        self.subscription.dispose();
        if let Err(payload) = outcome {
            resume_unwind(payload);
        }
    }

    fn on_completed(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        let outcome = catch_unwind(AssertUnwindSafe(|| self.observer.on_completed()));
        self.subscription.dispose();
        if let Err(payload) = outcome {
            resume_unwind(payload);
        }
    }
}

impl<T> Disposable for AutoDetachObserver<T> {
    fn dispose(&self) {
        self.stopped.store(true, Ordering::Release);
        self.subscription.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.subscription.is_disposed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disposables::BooleanDisposable;
    use crate::observers::AnonymousObserver;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recording() -> (Arc<Mutex<Vec<String>>>, ObserverRef<i32>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
        let obs = AnonymousObserver::new(move |v: i32| {
            if v < 0 {
                panic!("negative");
            }
            a.lock().push(format!("N({v})"));
        })
        .with_error(move |e| b.lock().push(format!("E({})", e.as_label())))
        .with_completed(move || c.lock().push("C".into()));
        (log, Arc::new(obs))
    }

    #[test]
    fn test_terminal_disposes_subscription() {
        let (log, obs) = recording();
        let auto = AutoDetachObserver::new(obs);
        let res = Arc::new(BooleanDisposable::new());
        auto.set_subscription(res.clone()).expect("assign");

        auto.on_next(1);
        auto.on_completed();
        auto.on_next(2);

        assert_eq!(*log.lock(), vec!["N(1)", "C"]);
        assert!(res.is_disposed());
        assert!(auto.is_disposed());
    }

    #[test]
    fn test_on_next_panic_becomes_on_error() {
        let (log, obs) = recording();
        let auto = AutoDetachObserver::new(obs);
        let res = Arc::new(BooleanDisposable::new());
        auto.set_subscription(res.clone()).expect("assign");

        auto.on_next(-1);
        auto.on_next(3);

        assert_eq!(*log.lock(), vec!["E(panicked)"]);
        assert!(res.is_disposed());
    }

    #[test]
    fn test_dispose_stops_delivery_and_releases() {
        let (log, obs) = recording();
        let auto = AutoDetachObserver::new(obs);
        auto.dispose();

        let late = Arc::new(BooleanDisposable::new());
        auto.set_subscription(late.clone()).expect("assign");
        auto.on_next(1);

        assert!(log.lock().is_empty());
        assert!(late.is_disposed(), "resources arriving after dispose are released");
    }

    #[test]
    fn test_on_error_panic_is_reraised_after_detach() {
        let auto = Arc::new(AutoDetachObserver::new(Arc::new(
            AnonymousObserver::<i32>::default(),
        ) as ObserverRef<i32>));
        let res = Arc::new(BooleanDisposable::new());
        auto.set_subscription(res.clone()).expect("assign");

        let a = Arc::clone(&auto);
        let outcome = catch_unwind(AssertUnwindSafe(move || a.on_error(RxError::failure("x"))));
        assert!(outcome.is_err(), "default on_error rethrows");
        assert!(res.is_disposed(), "subscription still detached");
    }
}
