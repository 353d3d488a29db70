use std::sync::Arc;

use super::{ScheduledAction, Scheduler, Timestamp};
use crate::disposables::{Disposable, DisposableRef, SingleAssignmentDisposable};
use crate::error::RxError;

/// A pending action with its due time.
///
/// The item's disposable is the handle returned to the caller of `schedule*`.
/// Disposing it before [`ScheduledItem::invoke`] cancels the item; the
/// disposable the action returns is assigned into it afterwards, so disposing
/// the handle later tears that chain down.
pub struct ScheduledItem {
    duetime: Timestamp,
    action: ScheduledAction,
    disposable: Arc<SingleAssignmentDisposable>,
}

impl ScheduledItem {
    #[must_use]
    pub fn new(duetime: Timestamp, action: ScheduledAction) -> Self {
        Self {
            duetime,
            action,
            disposable: Arc::new(SingleAssignmentDisposable::new()),
        }
    }

    #[must_use]
    pub fn duetime(&self) -> Timestamp {
        self.duetime
    }

    /// Handle that cancels this item.
    #[must_use]
    pub fn disposable(&self) -> DisposableRef {
        self.disposable.clone()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.disposable.is_disposed()
    }

    pub fn cancel(&self) {
        self.disposable.dispose();
    }

    /// Runs the action unless cancelled.
    pub fn invoke(self, scheduler: &dyn Scheduler) -> Result<(), RxError> {
        if self.is_cancelled() {
            return Ok(());
        }
        if let Some(inner) = (self.action)(scheduler)? {
            // Already assigned only happens if an action is invoked twice, which
            // ownership of `self` rules out.
            let _ = self.disposable.set(inner);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ScheduledItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledItem")
            .field("duetime", &self.duetime)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disposables::BooleanDisposable;
    use crate::scheduler::ImmediateScheduler;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_cancelled_item_does_not_run() {
        let ran = Arc::new(AtomicBool::new(false));
        let r = Arc::clone(&ran);
        let item = ScheduledItem::new(
            Timestamp::EPOCH,
            Box::new(move |_| {
                r.store(true, Ordering::SeqCst);
                Ok(None)
            }),
        );
        item.cancel();
        item.invoke(&ImmediateScheduler::new()).expect("cancelled invoke is ok");
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_returned_disposable_joins_handle() {
        let inner = Arc::new(BooleanDisposable::new());
        let i = inner.clone();
        let item = ScheduledItem::new(Timestamp::EPOCH, Box::new(move |_| Ok(Some(i as DisposableRef))));
        let handle = item.disposable();
        item.invoke(&ImmediateScheduler::new()).expect("invoke");

        assert!(!inner.is_disposed());
        handle.dispose();
        assert!(inner.is_disposed());
    }
}
