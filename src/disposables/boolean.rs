use std::sync::atomic::{AtomicBool, Ordering};

use super::Disposable;

/// Disposable that only records whether it has been disposed.
///
/// Producers poll it as a cancellation flag.
#[derive(Debug, Default)]
pub struct BooleanDisposable {
    disposed: AtomicBool,
}

impl BooleanDisposable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Disposable for BooleanDisposable {
    fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}
