//! # Observers
//!
//! An [`Observer`] is a sink of notifications: zero or more `on_next` calls
//! followed by at most one terminal (`on_error` or `on_completed`).
//!
//! | Type | Role |
//! |------|------|
//! | [`AnonymousObserver`] | builds an observer from closures; enforces the grammar |
//! | [`AutoDetachObserver`] | wraps every subscriber; converts handler panics, disposes on terminal |
//! | [`CheckedObserver`] | reports grammar violations (`ReEntrancy`, `Completed`) as errors |
//! | [`SynchronizedObserver`] | serialises deliveries from several producers |
//! | `LogObserver` | writes each notification to `tracing` (feature `logging`) |
//!
//! Observers are shared between producers and subscriptions, so the trait
//! takes `&self` and implementations keep their state behind atomics or locks.

mod anonymous;
mod auto_detach;
mod checked;
#[cfg(feature = "logging")]
mod log;
mod synchronized;

pub use anonymous::AnonymousObserver;
pub use auto_detach::AutoDetachObserver;
pub use checked::CheckedObserver;
#[cfg(feature = "logging")]
pub use log::LogObserver;
pub use synchronized::SynchronizedObserver;

use std::sync::Arc;

use crate::error::RxError;

/// Sink of notifications.
pub trait Observer<T>: Send + Sync {
    fn on_next(&self, value: T);

    fn on_error(&self, error: RxError);

    fn on_completed(&self);
}

/// Shared, type-erased observer.
pub type ObserverRef<T> = Arc<dyn Observer<T>>;

impl<T, O: Observer<T> + ?Sized> Observer<T> for Arc<O> {
    fn on_next(&self, value: T) {
        (**self).on_next(value);
    }

    fn on_error(&self, error: RxError) {
        (**self).on_error(error);
    }

    fn on_completed(&self) {
        (**self).on_completed();
    }
}
