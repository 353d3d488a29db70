//! # Notification
//!
//! A notification reified as a value: what an observer is told, detached
//! from the act of telling it. Test recordings, replay buffers and
//! `to_observable` all move notifications around as data.

use std::fmt;

use crate::error::RxError;
use crate::observable::Observable;
use crate::observers::Observer;
use crate::scheduler::SchedulerRef;

/// One `on_next`, `on_error` or `on_completed` as a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification<T> {
    OnNext(T),
    OnError(RxError),
    OnCompleted,
}

impl<T> Notification<T> {
    /// Delivers this notification to `observer`.
    pub fn accept(self, observer: &dyn Observer<T>) {
        match self {
            Notification::OnNext(value) => observer.on_next(value),
            Notification::OnError(error) => observer.on_error(error),
            Notification::OnCompleted => observer.on_completed(),
        }
    }

    /// `'N'`, `'E'` or `'C'`.
    #[must_use]
    pub fn kind(&self) -> char {
        match self {
            Notification::OnNext(_) => 'N',
            Notification::OnError(_) => 'E',
            Notification::OnCompleted => 'C',
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Notification::OnNext(_))
    }
}

impl<T> Notification<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Observable that delivers this notification (followed by `on_completed`
    /// for an `OnNext`) on `scheduler`, or on the current-thread trampoline.
    #[must_use]
    pub fn to_observable(&self, scheduler: Option<SchedulerRef>) -> Observable<T> {
        let source = match self {
            Notification::OnNext(value) => Observable::of(vec![value.clone()]),
            Notification::OnError(error) => Observable::throw(error.clone()),
            Notification::OnCompleted => Observable::empty(),
        };
        match scheduler {
            Some(scheduler) => source.subscribe_on(scheduler),
            None => source,
        }
    }
}

impl<T: fmt::Debug> fmt::Display for Notification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::OnNext(value) => write!(f, "OnNext({value:?})"),
            Notification::OnError(error) => write!(f, "OnError({error})"),
            Notification::OnCompleted => f.write_str("OnCompleted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observers::AnonymousObserver;
    use crate::scheduler::VirtualTimeScheduler;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<Notification<i32>>>>, AnonymousObserver<i32>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
        let obs = AnonymousObserver::new(move |v| a.lock().push(Notification::OnNext(v)))
            .with_error(move |e| b.lock().push(Notification::OnError(e)))
            .with_completed(move || c.lock().push(Notification::OnCompleted));
        (log, obs)
    }

    #[test]
    fn test_accept_dispatches_by_kind() {
        let (log, obs) = recorder();
        Notification::OnNext(7).accept(&obs);
        Notification::OnCompleted.accept(&obs);
        assert_eq!(
            *log.lock(),
            vec![Notification::OnNext(7), Notification::OnCompleted]
        );
    }

    #[test]
    fn test_kind_and_terminal() {
        assert_eq!(Notification::OnNext(1).kind(), 'N');
        assert_eq!(Notification::<i32>::OnError(RxError::Disposed).kind(), 'E');
        assert!(Notification::<i32>::OnCompleted.is_terminal());
        assert!(!Notification::OnNext(1).is_terminal());
    }

    #[test]
    fn test_to_observable_on_scheduler() {
        let vts = VirtualTimeScheduler::new();
        let (log, obs) = recorder();
        let _sub = Notification::OnNext(3)
            .to_observable(Some(Arc::new(vts.clone())))
            .subscribe(obs);
        assert!(log.lock().is_empty(), "nothing before the clock runs");

        vts.start().expect("run");
        assert_eq!(
            *log.lock(),
            vec![Notification::OnNext(3), Notification::OnCompleted]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Notification::OnNext(2).to_string(), "OnNext(2)");
        assert_eq!(Notification::<u8>::OnCompleted.to_string(), "OnCompleted");
    }
}
