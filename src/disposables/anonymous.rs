use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::Disposable;

type ReleaseFn = Box<dyn FnOnce() + Send>;

/// Disposable wrapping a release action that runs at most once.
///
/// The action is taken out of the slot before it runs, so a concurrent or
/// re-entrant second `dispose` finds nothing to do.
pub struct AnonymousDisposable {
    action: Mutex<Option<ReleaseFn>>,
    disposed: AtomicBool,
}

impl AnonymousDisposable {
    /// Creates a disposable that calls `action` on first disposal.
    #[must_use]
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            action: Mutex::new(Some(Box::new(action))),
            disposed: AtomicBool::new(false),
        }
    }
}

impl Disposable for AnonymousDisposable {
    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let action = self.action.lock().take();
        if let Some(action) = action {
            action();
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

/// Disposable with nothing to release. Always reports itself as disposed.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyDisposable;

impl Disposable for EmptyDisposable {
    fn dispose(&self) {}

    fn is_disposed(&self) -> bool {
        true
    }
}
