//! # Disposable graph
//!
//! A [`Disposable`] is a cancellable resource handle. Every subscription and
//! every scheduled action hands one back, and disposables nest: composites
//! own children, assignment slots own whatever is put into them, ref-count
//! disposables release their resource when both the primary and every inner
//! token are gone.
//!
//! ## Variants
//! ```text
//! AnonymousDisposable        runs a release action exactly once
//! EmptyDisposable            nothing to release
//! BooleanDisposable          only records that it was disposed
//! SingleAssignmentDisposable slot filled at most once
//! MultipleAssignmentDisposable slot replaced freely, old value kept alive
//! SerialDisposable           slot replaced, old value disposed
//! CompositeDisposable        set of children disposed together
//! RefCountDisposable         underlying released after primary + all inners
//! ScheduledDisposable        disposal dispatched through a scheduler
//! ```
//!
//! ## Rules
//! - `dispose()` is idempotent: the n-th call has the same effect as the first.
//! - Once a container is disposed, anything added or assigned to it is disposed immediately.
//! - Child disposal always runs outside the container's lock, so a child may
//!   reach back into its parent without deadlocking.

mod anonymous;
mod boolean;
mod composite;
mod multiple_assignment;
mod ref_count;
mod scheduled;
mod serial;
mod single_assignment;

pub use anonymous::{AnonymousDisposable, EmptyDisposable};
pub use boolean::BooleanDisposable;
pub use composite::CompositeDisposable;
pub use multiple_assignment::MultipleAssignmentDisposable;
pub use ref_count::RefCountDisposable;
pub use scheduled::ScheduledDisposable;
pub use serial::SerialDisposable;
pub use single_assignment::SingleAssignmentDisposable;

use std::sync::Arc;

/// A cancellable resource handle.
pub trait Disposable: Send + Sync {
    /// Releases the resource. Calling it again is a no-op.
    fn dispose(&self);

    /// Whether `dispose` has taken effect.
    fn is_disposed(&self) -> bool;
}

/// Shared, type-erased disposable.
pub type DisposableRef = Arc<dyn Disposable>;

impl<D: Disposable + ?Sized> Disposable for Arc<D> {
    fn dispose(&self) {
        (**self).dispose();
    }

    fn is_disposed(&self) -> bool {
        (**self).is_disposed()
    }
}

/// Disposable running `action` on first disposal.
#[must_use]
pub fn from_fn<F>(action: F) -> DisposableRef
where
    F: FnOnce() + Send + 'static,
{
    Arc::new(AnonymousDisposable::new(action))
}

/// Disposable with nothing to release.
#[must_use]
pub fn empty() -> DisposableRef {
    Arc::new(EmptyDisposable)
}

/// Identity comparison that ignores vtable pointers.
pub(crate) fn same(a: &DisposableRef, b: &DisposableRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
