//! # Subjects
//!
//! A subject is both an [`Observer`] and an observable: what it is told, it
//! broadcasts to its subscribers.
//!
//! | Subject | On subscribe | On terminal |
//! |---------|--------------|-------------|
//! | [`Subject`] | nothing replayed | terminal retained for late subscribers |
//! | [`BehaviorSubject`] | current value (seed at first) | terminal only |
//! | [`ReplaySubject`] | buffered values, bounded by count and time window | buffer, then terminal |
//! | [`AsyncSubject`] | nothing until completion | last value + completion |
//!
//! ## Rules
//! - Every broadcast iterates a snapshot of the subscriber list. A subscriber
//!   added during a broadcast does not receive that notification; one removed
//!   during a broadcast stops receiving as soon as its removal is observed.
//! - Subscribers are served in subscription order.
//! - The subscriber list sits behind a re-entrant lock: an observer may call
//!   back into the subject that is serving it.
//! - After `dispose()` the inherent `try_*` methods fail with
//!   [`RxError::Disposed`](crate::RxError::Disposed); the [`Observer`] impl
//!   logs and drops instead. Subscribing to a disposed subject delivers
//!   `on_error(Disposed)`.
//! - A subscription handle holds the subject weakly; disposing it removes the
//!   observer from the list.

mod async_subject;
mod behavior;
mod hub;
mod replay;
mod subject;

pub use async_subject::AsyncSubject;
pub use behavior::BehaviorSubject;
pub use replay::ReplaySubject;
pub use subject::Subject;

use crate::observable::Observable;
use crate::observers::Observer;

/// Something that can be both fed and subscribed to.
pub trait SubjectLike<T>: Observer<T> {
    /// The subscribe side.
    fn as_observable(&self) -> Observable<T>;
}
