use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::{Disposable, DisposableRef, empty};

#[derive(Default)]
struct Counts {
    outstanding: usize,
    primary_disposed: bool,
    fully_disposed: bool,
}

struct Shared {
    underlying: DisposableRef,
    counts: Mutex<Counts>,
}

impl Shared {
    fn release(&self) {
        let dispose_now = {
            let mut c = self.counts.lock();
            c.outstanding = c.outstanding.saturating_sub(1);
            if c.primary_disposed && c.outstanding == 0 && !c.fully_disposed {
                c.fully_disposed = true;
                true
            } else {
                false
            }
        };
        if dispose_now {
            self.underlying.dispose();
        }
    }
}

/// Guards an underlying disposable with a count of outstanding inner tokens.
///
/// ## States
/// ```text
/// active ──dispose()──► primary_disposed ──last inner released──► fully_disposed
///   │                                                              ▲
///   └────────dispose() with no outstanding inner tokens────────────┘
/// ```
///
/// The underlying resource is released iff the primary has been disposed AND
/// no inner token is outstanding. `get_inner` after full disposal hands back a
/// no-op disposable.
#[derive(Clone)]
pub struct RefCountDisposable {
    shared: Arc<Shared>,
}

impl RefCountDisposable {
    #[must_use]
    pub fn new(underlying: DisposableRef) -> Self {
        Self {
            shared: Arc::new(Shared {
                underlying,
                counts: Mutex::new(Counts::default()),
            }),
        }
    }

    /// Returns a token keeping the underlying resource alive until disposed.
    #[must_use]
    pub fn get_inner(&self) -> DisposableRef {
        {
            let mut c = self.shared.counts.lock();
            if c.fully_disposed {
                return empty();
            }
            c.outstanding += 1;
        }
        Arc::new(InnerToken {
            parent: Arc::clone(&self.shared),
            disposed: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub fn is_primary_disposed(&self) -> bool {
        self.shared.counts.lock().primary_disposed
    }

    /// Number of inner tokens not yet disposed.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.shared.counts.lock().outstanding
    }
}

impl Disposable for RefCountDisposable {
    fn dispose(&self) {
        let dispose_now = {
            let mut c = self.shared.counts.lock();
            if c.primary_disposed {
                return;
            }
            c.primary_disposed = true;
            if c.outstanding == 0 && !c.fully_disposed {
                c.fully_disposed = true;
                true
            } else {
                false
            }
        };
        if dispose_now {
            self.shared.underlying.dispose();
        }
    }

    fn is_disposed(&self) -> bool {
        self.shared.counts.lock().fully_disposed
    }
}

struct InnerToken {
    parent: Arc<Shared>,
    disposed: AtomicBool,
}

impl Disposable for InnerToken {
    fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            self.parent.release();
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disposables::BooleanDisposable;

    #[test]
    fn test_primary_without_inners_releases_immediately() {
        let res = Arc::new(BooleanDisposable::new());
        let rc = RefCountDisposable::new(res.clone());
        rc.dispose();
        assert!(res.is_disposed());
        assert!(rc.is_disposed());
    }

    #[test]
    fn test_waits_for_last_inner() {
        let res = Arc::new(BooleanDisposable::new());
        let rc = RefCountDisposable::new(res.clone());
        let a = rc.get_inner();
        let b = rc.get_inner();

        rc.dispose();
        assert!(rc.is_primary_disposed());
        assert!(!res.is_disposed(), "inner tokens still outstanding");

        a.dispose();
        a.dispose();
        assert_eq!(rc.outstanding(), 1, "double dispose must not double release");
        assert!(!res.is_disposed());

        b.dispose();
        assert!(res.is_disposed());
    }

    #[test]
    fn test_inners_alone_never_release() {
        let res = Arc::new(BooleanDisposable::new());
        let rc = RefCountDisposable::new(res.clone());
        rc.get_inner().dispose();
        rc.get_inner().dispose();
        assert!(!res.is_disposed());
    }

    #[test]
    fn test_get_inner_after_full_disposal_is_noop() {
        let res = Arc::new(BooleanDisposable::new());
        let rc = RefCountDisposable::new(res.clone());
        rc.dispose();
        let late = rc.get_inner();
        assert_eq!(rc.outstanding(), 0);
        late.dispose();
        assert!(res.is_disposed());
    }
}
