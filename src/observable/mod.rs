//! # Observable
//!
//! An [`Observable`] is a subscription function. Subscribing runs it with the
//! subscriber and hands back a disposable that ends the subscription.
//!
//! ## Subscription path
//! ```text
//! subscribe(observer, scheduler?)
//!   └─ wrap observer in AutoDetachObserver
//!        ├─ scheduler given     ─► scheduler.schedule(run subscription fn)
//!        │                         handle = Composite(schedule handle, auto-detach)
//!        ├─ trampoline idle     ─► run subscription fn on the current-thread trampoline
//!        └─ trampoline running  ─► run subscription fn inline
//!   subscription fn returns resources ─► attached to the auto-detach wrapper
//! ```
//!
//! Going through the trampoline first means the wrapper owns the resources
//! before any trampolined emission reaches the observer, so a subscriber can
//! dispose itself from `on_next`.
//!
//! ## Rules
//! - Grammar: `on_next* (on_error | on_completed)?`, enforced by the wrapper.
//! - Disposing the returned handle stops delivery and releases the resources.
//! - A terminal releases the resources too.
//! - A panic in the subscription function or in `on_next` becomes `on_error(Panicked)`.
//!
//! ## Multicast
//! [`ConnectableObservable`] routes one upstream subscription through a
//! subject; [`ConnectableObservable::ref_count`] and [`Observable::share`]
//! connect and disconnect it with the number of subscribers.

mod base;
mod connectable;
mod creation;
mod run;

pub use base::{Observable, SubscribeFn};
pub use connectable::ConnectableObservable;
