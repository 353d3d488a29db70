use parking_lot::Mutex;

use super::{Disposable, DisposableRef, same};

#[derive(Default)]
struct Members {
    items: Vec<DisposableRef>,
    disposed: bool,
}

/// A set of disposables disposed together.
///
/// ## Rules
/// - `add` on a disposed composite disposes the child immediately.
/// - `remove` disposes the child it removes.
/// - `dispose` snapshots the members, clears the set, flips to disposed, then
///   disposes the snapshot in insertion order.
/// - `clear` disposes the members but keeps the composite usable.
///
/// Children are compared by identity (`Arc` pointer).
#[derive(Default)]
pub struct CompositeDisposable {
    members: Mutex<Members>,
}

impl CompositeDisposable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a composite owning `items`.
    #[must_use]
    pub fn from_vec(items: Vec<DisposableRef>) -> Self {
        Self {
            members: Mutex::new(Members {
                items,
                disposed: false,
            }),
        }
    }

    pub fn add(&self, child: DisposableRef) {
        {
            let mut members = self.members.lock();
            if !members.disposed {
                members.items.push(child);
                return;
            }
        }
        child.dispose();
    }

    /// Removes and disposes `child`; returns whether it was a member.
    pub fn remove(&self, child: &DisposableRef) -> bool {
        let removed = {
            let mut members = self.members.lock();
            if members.disposed {
                return false;
            }
            match members.items.iter().position(|d| same(d, child)) {
                Some(idx) => Some(members.items.remove(idx)),
                None => None,
            }
        };
        match removed {
            Some(d) => {
                d.dispose();
                true
            }
            None => false,
        }
    }

    /// Disposes every member without disposing the composite itself.
    pub fn clear(&self) {
        let snapshot = std::mem::take(&mut self.members.lock().items);
        for d in snapshot {
            d.dispose();
        }
    }

    #[must_use]
    pub fn contains(&self, child: &DisposableRef) -> bool {
        self.members.lock().items.iter().any(|d| same(d, child))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.lock().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<DisposableRef>> for CompositeDisposable {
    fn from(items: Vec<DisposableRef>) -> Self {
        Self::from_vec(items)
    }
}

impl Disposable for CompositeDisposable {
    fn dispose(&self) {
        let snapshot = {
            let mut members = self.members.lock();
            if members.disposed {
                return;
            }
            members.disposed = true;
            std::mem::take(&mut members.items)
        };
        for d in snapshot {
            d.dispose();
        }
    }

    fn is_disposed(&self) -> bool {
        self.members.lock().disposed
    }
}
