use std::sync::Arc;

use super::SubjectLike;
use super::hub::{Hub, Terminal, broadcast_next, broadcast_terminal};
use crate::disposables::{self, Disposable, DisposableRef};
use crate::error::RxError;
use crate::observable::Observable;
use crate::observers::{Observer, ObserverRef};

/// Subject holding a current value, seeded at construction.
///
/// A new subscriber first receives the current value, then live
/// notifications. After a terminal, subscribers get the terminal only.
pub struct BehaviorSubject<T> {
    hub: Arc<Hub<T, T>>,
}

impl<T> Clone for BehaviorSubject<T> {
    fn clone(&self) -> Self {
        Self {
            hub: Arc::clone(&self.hub),
        }
    }
}

impl<T: Clone + Send + 'static> BehaviorSubject<T> {
    #[must_use]
    pub fn new(seed: T) -> Self {
        Self { hub: Hub::new(seed) }
    }

    /// The latest value, or the error the subject failed with.
    pub fn value(&self) -> Result<T, RxError> {
        self.hub.with_live(|s| match &s.terminal {
            Some(Terminal::Failed(err)) => Err(err.clone()),
            _ => Ok(s.extra.clone()),
        })?
    }

    pub fn try_on_next(&self, value: T) -> Result<(), RxError> {
        let targets = self.hub.with_live(|s| {
            if s.is_stopped() {
                return Vec::new();
            }
            s.extra = value.clone();
            s.snapshot()
        })?;
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

    #[must_use]
    pub fn as_observable(&self) -> Observable<T> {
        let hub = Arc::clone(&self.hub);
        Observable::create(move |observer, _| subscribe_to(&hub, observer))
    }
}

fn subscribe_to<T: Clone + Send + 'static>(hub: &Arc<Hub<T, T>>, observer: ObserverRef<T>) -> DisposableRef {
    // The seed goes out under the lock so no newer value can overtake it.
    let guard = hub.lock();
    let joined = {
        let mut state = guard.borrow_mut();
        match (state.disposed, state.terminal.clone()) {
            (true, _) => Err(Terminal::Failed(RxError::Disposed)),
            (false, Some(terminal)) => Err(terminal),
            (false, None) => {
                let seed = state.extra.clone();
                let (entry, subscription) = hub.attach(&mut state, Arc::clone(&observer));
                Ok((entry, seed, subscription))
            }
        }
    };
    match joined {
        Ok((entry, seed, subscription)) => {
            entry.deliver(|o| o.on_next(seed));
            subscription
        }
        Err(terminal) => {
            drop(guard);
            terminal.deliver(observer.as_ref());
            disposables::empty()
        }
    }
}

impl<T: Clone + Send + 'static> Observer<T> for BehaviorSubject<T> {
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

impl<T: Clone + Send + 'static> SubjectLike<T> for BehaviorSubject<T> {
    fn as_observable(&self) -> Observable<T> {
        BehaviorSubject::as_observable(self)
    }
}

impl<T: Send + 'static> Disposable for BehaviorSubject<T> {
    fn dispose(&self) {
        self.hub.dispose_with(|_| {});
    }

    fn is_disposed(&self) -> bool {
        self.hub.is_disposed()
    }
}
