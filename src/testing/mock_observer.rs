use std::sync::Arc;

use parking_lot::Mutex;

use super::Recorded;
use crate::error::RxError;
use crate::notification::Notification;
use crate::observers::Observer;
use crate::scheduler::VirtualTimeScheduler;

/// Observer recording every notification with the virtual time it arrived.
///
/// Clones share one recording, so a clone can be handed to a subscription
/// while the test keeps the original for assertions.
pub struct MockObserver<T> {
    scheduler: VirtualTimeScheduler,
    messages: Arc<Mutex<Vec<Recorded<T>>>>,
}

impl<T> Clone for MockObserver<T> {
    fn clone(&self) -> Self {
        Self {
            scheduler: self.scheduler.clone(),
            messages: Arc::clone(&self.messages),
        }
    }
}

impl<T> MockObserver<T> {
    #[must_use]
    pub fn new(scheduler: VirtualTimeScheduler) -> Self {
        Self {
            scheduler,
            messages: Arc::default(),
        }
    }

    fn record(&self, value: Notification<T>) {
        let time = self.scheduler.ticks();
        self.messages.lock().push(Recorded::new(time, value));
    }
}

impl<T: Clone> MockObserver<T> {
    /// Everything recorded so far.
    #[must_use]
    pub fn messages(&self) -> Vec<Recorded<T>> {
        self.messages.lock().clone()
    }
}

impl<T: Send> Observer<T> for MockObserver<T> {
    fn on_next(&self, value: T) {
        self.record(Notification::OnNext(value));
    }

    fn on_error(&self, error: RxError) {
        self.record(Notification::OnError(error));
    }

    fn on_completed(&self) {
        self.record(Notification::OnCompleted);
    }
}
