use std::sync::atomic::{AtomicBool, Ordering};

use super::Observer;
use crate::disposables::Disposable;
use crate::error::RxError;

type NextFn<T> = Box<dyn Fn(T) + Send + Sync>;
type ErrorFn = Box<dyn Fn(RxError) + Send + Sync>;
type CompletedFn = Box<dyn Fn() + Send + Sync>;

/// Observer assembled from closures.
///
/// Every callback is optional; the defaults are:
/// - `on_next`: ignore the value;
/// - `on_error`: panic with the error (an unhandled error is a bug);
/// - `on_completed`: do nothing.
///
/// The grammar is enforced: after the first terminal (or `dispose`) every
/// further notification is dropped.
///
/// # Example
/// ```
/// use rxfabric::{AnonymousObserver, Observer};
///
/// let obs = AnonymousObserver::new(|v: i32| println!("got {v}"))
///     .with_error(|e| eprintln!("failed: {e}"))
///     .with_completed(|| println!("done"));
/// obs.on_next(1);
/// obs.on_completed();
/// assert!(obs.is_stopped());
/// ```
pub struct AnonymousObserver<T> {
    on_next: NextFn<T>,
    on_error: ErrorFn,
    on_completed: CompletedFn,
    stopped: AtomicBool,
}

impl<T> Default for AnonymousObserver<T> {
    fn default() -> Self {
        Self {
            on_next: Box::new(|_| {}),
            on_error: Box::new(|err| panic!("unhandled error in observer: {err}")),
            on_completed: Box::new(|| {}),
            stopped: AtomicBool::new(false),
        }
    }
}

impl<T> AnonymousObserver<T> {
    /// Observer calling `on_next` for each value; other callbacks default.
    #[must_use]
    pub fn new<F>(on_next: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            on_next: Box::new(on_next),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_next<F>(mut self, on_next: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.on_next = Box::new(on_next);
        self
    }

    #[must_use]
    pub fn with_error<F>(mut self, on_error: F) -> Self
    where
        F: Fn(RxError) + Send + Sync + 'static,
    {
        self.on_error = Box::new(on_error);
        self
    }

    #[must_use]
    pub fn with_completed<F>(mut self, on_completed: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_completed = Box::new(on_completed);
        self
    }

    /// Whether a terminal was delivered or the observer was disposed.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Delivers `error` unless already stopped; returns whether it was delivered.
    pub fn fail(&self, error: RxError) -> bool {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return false;
        }
        (self.on_error)(error);
        true
    }
}

impl<T> Observer<T> for AnonymousObserver<T> {
    fn on_next(&self, value: T) {
        if !self.is_stopped() {
            (self.on_next)(value);
        }
    }

    fn on_error(&self, error: RxError) {
        self.fail(error);
    }

    fn on_completed(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            (self.on_completed)();
        }
    }
}

impl<T> Disposable for AnonymousObserver<T> {
    fn dispose(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    fn is_disposed(&self) -> bool {
        self.is_stopped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_nothing_after_terminal() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
        let obs = AnonymousObserver::new(move |v: i32| a.lock().push(format!("N({v})")))
            .with_error(move |e| b.lock().push(format!("E({})", e.as_label())))
            .with_completed(move || c.lock().push("C".to_string()));

        obs.on_next(1);
        obs.on_completed();
        obs.on_next(2);
        obs.on_error(RxError::Disposed);
        obs.on_completed();

        assert_eq!(*log.lock(), vec!["N(1)", "C"]);
    }

    #[test]
    fn test_fail_reports_delivery() {
        let obs = AnonymousObserver::<u8>::default().with_error(|_| {});
        assert!(obs.fail(RxError::failure("x")));
        assert!(!obs.fail(RxError::failure("y")));
    }

    #[test]
    fn test_dispose_silences() {
        let hits = Arc::new(Mutex::new(0));
        let h = Arc::clone(&hits);
        let obs = AnonymousObserver::new(move |_: ()| *h.lock() += 1);
        obs.on_next(());
        obs.dispose();
        obs.on_next(());
        assert_eq!(*hits.lock(), 1);
        assert!(obs.is_disposed());
    }

    #[test]
    #[should_panic(expected = "unhandled error in observer")]
    fn test_default_error_handler_rethrows() {
        let obs = AnonymousObserver::<i32>::default();
        obs.on_error(RxError::failure("nobody listens"));
    }
}
