use crate::error::RxError;
use crate::notification::Notification;

/// A notification stamped with the virtual time (in ticks) it was seen at.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded<T> {
    pub time: f64,
    pub value: Notification<T>,
}

impl<T> Recorded<T> {
    #[must_use]
    pub fn new(time: f64, value: Notification<T>) -> Self {
        Self { time, value }
    }
}

/// `OnNext(value)` at `time`.
#[must_use]
pub fn on_next<T>(time: f64, value: T) -> Recorded<T> {
    Recorded::new(time, Notification::OnNext(value))
}

/// `OnError(error)` at `time`.
#[must_use]
pub fn on_error<T>(time: f64, error: RxError) -> Recorded<T> {
    Recorded::new(time, Notification::OnError(error))
}

/// `OnCompleted` at `time`.
#[must_use]
pub fn on_completed<T>(time: f64) -> Recorded<T> {
    Recorded::new(time, Notification::OnCompleted)
}

/// When a test observable was subscribed to and, if it was, unsubscribed from.
///
/// `unsubscribe` is `f64::INFINITY` while the subscription is live.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Subscription {
    pub subscribe: f64,
    pub unsubscribe: f64,
}

impl Subscription {
    #[must_use]
    pub fn new(subscribe: f64, unsubscribe: f64) -> Self {
        Self {
            subscribe,
            unsubscribe,
        }
    }

    /// Subscription still live.
    #[must_use]
    pub fn open(subscribe: f64) -> Self {
        Self::new(subscribe, f64::INFINITY)
    }
}

/// Shorthand for [`Subscription::new`].
#[must_use]
pub fn subscribed(start: f64, end: f64) -> Subscription {
    Subscription::new(start, end)
}
