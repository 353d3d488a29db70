use std::sync::Arc;

use super::SubjectLike;
use super::hub::{Hub, Terminal, broadcast_next, broadcast_terminal};
use crate::disposables::{self, Disposable, DisposableRef};
use crate::error::RxError;
use crate::observable::Observable;
use crate::observers::{Observer, ObserverRef};

/// Broadcasts every notification to the subscribers present at that moment.
///
/// Nothing is replayed; a subscriber arriving after the terminal receives
/// the terminal immediately.
///
/// # Example
/// ```
/// use rxfabric::{Observer, Subject};
///
/// let subject = Subject::new();
/// let _sub = subject.as_observable().subscribe_fn(|v: i32| println!("got {v}"));
/// subject.on_next(1);
/// subject.on_completed();
/// ```
pub struct Subject<T> {
    hub: Arc<Hub<T, ()>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            hub: Arc::clone(&self.hub),
        }
    }
}

impl<T: Clone + Send + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> Subject<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { hub: Hub::new(()) }
    }

    /// Broadcasts `value`; fails with [`RxError::Disposed`] after `dispose`.
    pub fn try_on_next(&self, value: T) -> Result<(), RxError> {
        let targets = self
            .hub
            .with_live(|s| if s.is_stopped() { Vec::new() } else { s.snapshot() })?;
        broadcast_next(&targets, &value);
        Ok(())
    }

    pub fn try_on_error(&self, error: RxError) -> Result<(), RxError> {
        self.terminate(Terminal::Failed(error))
    }

    pub fn try_on_completed(&self) -> Result<(), RxError> {
        self.terminate(Terminal::Completed)
    }

    fn terminate(&self, terminal: Terminal) -> Result<(), RxError> {
        let targets = self.hub.with_live(|s| {
            if s.is_stopped() {
                Vec::new()
            } else {
                s.stop(terminal.clone())
            }
        })?;
        broadcast_terminal(&targets, &terminal);
        Ok(())
    }

    #[must_use]
    pub fn has_observers(&self) -> bool {
        self.hub.has_observers()
    }

    /// The subscribe side of the subject.
    #[must_use]
    pub fn as_observable(&self) -> Observable<T> {
        let hub = Arc::clone(&self.hub);
        Observable::create(move |observer, _| subscribe_to(&hub, observer))
    }
}

fn subscribe_to<T: Send + 'static>(hub: &Arc<Hub<T, ()>>, observer: ObserverRef<T>) -> DisposableRef {
    let guard = hub.lock();
    let joined = {
        let mut state = guard.borrow_mut();
        match (state.disposed, state.terminal.clone()) {
            (true, _) => Err(Terminal::Failed(RxError::Disposed)),
            (false, Some(terminal)) => Err(terminal),
            (false, None) => Ok(hub.attach(&mut state, Arc::clone(&observer)).1),
        }
    };
    drop(guard);
    joined.unwrap_or_else(|terminal| {
        terminal.deliver(observer.as_ref());
        disposables::empty()
    })
}

impl<T: Clone + Send + 'static> Observer<T> for Subject<T> {
    fn on_next(&self, value: T) {
        if let Err(err) = self.try_on_next(value) {
            tracing::warn!(label = err.as_label(), "subject dropped on_next: {err}");
        }
    }

    fn on_error(&self, error: RxError) {
        if let Err(err) = self.try_on_error(error) {
            tracing::warn!(label = err.as_label(), "subject dropped on_error: {err}");
        }
    }

    fn on_completed(&self) {
        if let Err(err) = self.try_on_completed() {
            tracing::warn!(label = err.as_label(), "subject dropped on_completed: {err}");
        }
    }
}

impl<T: Clone + Send + 'static> SubjectLike<T> for Subject<T> {
    fn as_observable(&self) -> Observable<T> {
        Subject::as_observable(self)
    }
}

impl<T: Send + 'static> Disposable for Subject<T> {
    fn dispose(&self) {
        self.hub.dispose_with(|_| {});
    }

    fn is_disposed(&self) -> bool {
        self.hub.is_disposed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Notification;
    use crate::observers::AnonymousObserver;
    use parking_lot::Mutex;

    type Log = Arc<Mutex<Vec<Notification<i32>>>>;

    fn recorder() -> (Log, AnonymousObserver<i32>) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
        let obs = AnonymousObserver::new(move |v| a.lock().push(Notification::OnNext(v)))
            .with_error(move |e| b.lock().push(Notification::OnError(e)))
            .with_completed(move || c.lock().push(Notification::OnCompleted));
        (log, obs)
    }

    #[test]
    fn test_fan_out_to_current_subscribers() {
        let subject = Subject::new();
        let (a, obs_a) = recorder();
        let (b, obs_b) = recorder();

        let _sa = subject.as_observable().subscribe(obs_a);
        subject.on_next(1);
        let _sb = subject.as_observable().subscribe(obs_b);
        subject.on_next(2);
        subject.on_completed();

        use Notification::*;
        assert_eq!(*a.lock(), vec![OnNext(1), OnNext(2), OnCompleted]);
        assert_eq!(*b.lock(), vec![OnNext(2), OnCompleted]);
        assert!(!subject.has_observers());
    }

    #[test]
    fn test_late_subscriber_gets_terminal() {
        let subject = Subject::<i32>::new();
        subject.on_error(RxError::failure("gone"));
        let (log, obs) = recorder();
        let sub = subject.as_observable().subscribe(obs);
        assert_eq!(*log.lock(), vec![Notification::OnError(RxError::failure("gone"))]);
        assert!(sub.is_disposed());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let subject = Subject::new();
        let (log, obs) = recorder();
        let sub = subject.as_observable().subscribe(obs);
        subject.on_next(1);
        sub.dispose();
        subject.on_next(2);
        assert_eq!(*log.lock(), vec![Notification::OnNext(1)]);
        assert!(!subject.has_observers());
    }

    #[test]
    fn test_disposed_subject_refuses() {
        let subject = Subject::<i32>::new();
        subject.dispose();
        assert_eq!(subject.try_on_next(1), Err(RxError::Disposed));
        assert_eq!(subject.try_on_completed(), Err(RxError::Disposed));

        let (log, obs) = recorder();
        subject.as_observable().subscribe(obs);
        assert_eq!(*log.lock(), vec![Notification::OnError(RxError::Disposed)]);
    }

    #[test]
    fn test_subscriber_added_during_broadcast_misses_that_value() {
        let subject = Subject::new();
        let (late, late_obs) = recorder();
        let late_obs = Arc::new(late_obs) as ObserverRef<i32>;
        let s = subject.clone();
        let _first = subject.as_observable().subscribe_fn(move |v: i32| {
            if v == 1 {
                s.as_observable().subscribe_arc(Arc::clone(&late_obs));
            }
        });

        subject.on_next(1);
        subject.on_next(2);
        assert_eq!(*late.lock(), vec![Notification::OnNext(2)]);
    }

    #[test]
    fn test_reentrant_emission_from_observer() {
        let subject = Subject::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (s, l) = (subject.clone(), Arc::clone(&seen));
        let _sub = subject.as_observable().subscribe_fn(move |v: i32| {
            l.lock().push(v);
            if v < 3 {
                s.on_next(v + 1);
            }
        });
        subject.on_next(1);
        assert_eq!(*seen.lock(), vec![1, 2, 3]);
    }
}
