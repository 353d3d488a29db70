use parking_lot::Mutex;

use super::{Disposable, DisposableRef};
use crate::error::RxError;

#[derive(Default)]
struct Slot {
    current: Option<DisposableRef>,
    assigned: bool,
    disposed: bool,
}

/// Slot that accepts exactly one inner disposable.
///
/// Assigning after disposal disposes the incoming value. A second assignment
/// is a contract violation and returns [`RxError::AlreadyAssigned`]; the
/// incoming value is left untouched so the caller decides its fate.
#[derive(Default)]
pub struct SingleAssignmentDisposable {
    slot: Mutex<Slot>,
}

impl SingleAssignmentDisposable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the inner disposable.
    pub fn set(&self, value: DisposableRef) -> Result<(), RxError> {
        let dispose_now = {
            let mut slot = self.slot.lock();
            if slot.assigned {
                return Err(RxError::AlreadyAssigned);
            }
            slot.assigned = true;
            if slot.disposed {
                true
            } else {
                slot.current = Some(value.clone());
                false
            }
        };
        if dispose_now {
            value.dispose();
        }
        Ok(())
    }

    /// Current inner disposable, if assigned and not yet disposed.
    #[must_use]
    pub fn get(&self) -> Option<DisposableRef> {
        self.slot.lock().current.clone()
    }

    /// Whether a value has been assigned (even if it was disposed on arrival).
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        self.slot.lock().assigned
    }
}

impl Disposable for SingleAssignmentDisposable {
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
    use crate::disposables::{BooleanDisposable, empty};
    use std::sync::Arc;

    #[test]
    fn test_dispose_reaches_inner() {
        let sad = SingleAssignmentDisposable::new();
        let inner = Arc::new(BooleanDisposable::new());
        sad.set(inner.clone()).expect("first assignment");
        assert!(!inner.is_disposed());

        sad.dispose();
        assert!(inner.is_disposed());
        assert!(sad.get().is_none());
    }

    #[test]
    fn test_set_after_dispose_disposes_incoming() {
        let sad = SingleAssignmentDisposable::new();
        sad.dispose();

        let inner = Arc::new(BooleanDisposable::new());
        sad.set(inner.clone()).expect("assignment after dispose is allowed");
        assert!(inner.is_disposed(), "late value must be disposed on arrival");
    }

    #[test]
    fn test_second_assignment_is_rejected() {
        let sad = SingleAssignmentDisposable::new();
        sad.set(empty()).expect("first assignment");

        let second = Arc::new(BooleanDisposable::new());
        assert_eq!(sad.set(second.clone()), Err(RxError::AlreadyAssigned));
        assert!(!second.is_disposed(), "rejected value is left to the caller");
    }
}
