use parking_lot::Mutex;

use super::{Disposable, DisposableRef};

#[derive(Default)]
struct Slot {
    current: Option<DisposableRef>,
    disposed: bool,
}

/// Slot whose inner disposable is replaced, disposing the previous one.
#[derive(Default)]
pub struct SerialDisposable {
    slot: Mutex<Slot>,
}

impl SerialDisposable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `value` and disposes whatever it replaced.
    ///
    /// If the serial disposable is already disposed, `value` is disposed instead.
    pub fn set(&self, value: DisposableRef) {
        let to_dispose = {
            let mut slot = self.slot.lock();
            if slot.disposed {
                Some(value)
            } else {
                slot.current.replace(value)
            }
        };
        if let Some(old) = to_dispose {
            old.dispose();
        }
    }

    #[must_use]
    pub fn get(&self) -> Option<DisposableRef> {
        self.slot.lock().current.clone()
    }
}

impl Disposable for SerialDisposable {
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
