use parking_lot::Mutex;

use super::{Disposable, DisposableRef};

#[derive(Default)]
struct Slot {
    current: Option<DisposableRef>,
    disposed: bool,
}

/// Slot whose inner disposable may be replaced any number of times.
///
/// Replacing does NOT dispose the previous value. Periodic scheduling keeps
/// the handle of the latest re-schedule here.
#[derive(Default)]
pub struct MultipleAssignmentDisposable {
    slot: Mutex<Slot>,
}

impl MultipleAssignmentDisposable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the inner disposable; disposes `value` instead if already disposed.
    pub fn set(&self, value: DisposableRef) {
        {
            let mut slot = self.slot.lock();
            if !slot.disposed {
                slot.current = Some(value);
                return;
            }
        }
        value.dispose();
    }

    #[must_use]
    pub fn get(&self) -> Option<DisposableRef> {
        self.slot.lock().current.clone()
    }
}

impl Disposable for MultipleAssignmentDisposable {
    fn dispose(&self) {
        let current = {
            let mut slot = self.slot.lock();
            if slot.disposed {
                return;
            }
            slot.disposed = true;
            slot.current.take()
        };
        if let Some(d) = current {
            d.dispose();
        }
    }

    fn is_disposed(&self) -> bool {
        self.slot.lock().disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disposables::BooleanDisposable;
    use std::sync::Arc;

    #[test]
    fn test_replace_keeps_previous_alive() {
        let mad = MultipleAssignmentDisposable::new();
        let first = Arc::new(BooleanDisposable::new());
        let second = Arc::new(BooleanDisposable::new());

        mad.set(first.clone());
        mad.set(second.clone());
        assert!(!first.is_disposed());

        mad.dispose();
        assert!(!first.is_disposed(), "replaced values are not owned anymore");
        assert!(second.is_disposed());

        let late = Arc::new(BooleanDisposable::new());
        mad.set(late.clone());
        assert!(late.is_disposed());
    }
}
