use std::sync::Arc;

use super::SubjectLike;
use super::hub::{Hub, Terminal, broadcast_terminal};
use crate::disposables::{self, Disposable, DisposableRef};
use crate::error::RxError;
use crate::observable::Observable;
use crate::observers::{Observer, ObserverRef};

/// Subject emitting only the final value, at completion.
///
/// Values are held back until `on_completed`; then the last one (if any) is
/// delivered followed by the completion. Late subscribers receive the same
/// pair. On error the value is discarded and only the error goes out.
pub struct AsyncSubject<T> {
    hub: Arc<Hub<T, Option<T>>>,
}

impl<T> Clone for AsyncSubject<T> {
    fn clone(&self) -> Self {
        Self {
            hub: Arc::clone(&self.hub),
        }
    }
}

impl<T: Clone + Send + 'static> Default for AsyncSubject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> AsyncSubject<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { hub: Hub::new(None) }
    }

    pub fn try_on_next(&self, value: T) -> Result<(), RxError> {
        self.hub.with_live(|s| {
            if !s.is_stopped() {
                s.extra = Some(value);
            }
        })
    }

    pub fn try_on_error(&self, error: RxError) -> Result<(), RxError> {
        let terminal = Terminal::Failed(error);
        let targets = self.hub.with_live(|s| {
            if s.is_stopped() {
                return Vec::new();
            }
            s.extra = None;
            s.stop(terminal.clone())
        })?;
        broadcast_terminal(&targets, &terminal);
        Ok(())
    }

    pub fn try_on_completed(&self) -> Result<(), RxError> {
        let (targets, last) = self.hub.with_live(|s| {
            if s.is_stopped() {
                return (Vec::new(), None);
            }
            let last = s.extra.clone();
            (s.stop(Terminal::Completed), last)
        })?;
        for entry in &targets {
            entry.deliver(|o| {
                if let Some(value) = &last {
                    o.on_next(value.clone());
                }
                o.on_completed();
            });
        }
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

fn subscribe_to<T: Clone + Send + 'static>(hub: &Arc<Hub<T, Option<T>>>, observer: ObserverRef<T>) -> DisposableRef {
    let ended = {
        let guard = hub.lock();
        let mut state = guard.borrow_mut();
        if state.disposed {
            Err((None, Terminal::Failed(RxError::Disposed)))
        } else if let Some(terminal) = state.terminal.clone() {
            Err((state.extra.clone(), terminal))
        } else {
            Ok(hub.attach(&mut state, Arc::clone(&observer)).1)
        }
    };
    ended.unwrap_or_else(|(last, terminal)| {
        if let (Some(value), Terminal::Completed) = (last, &terminal) {
            observer.on_next(value);
        }
        terminal.deliver(observer.as_ref());
        disposables::empty()
    })
}

impl<T: Clone + Send + 'static> Observer<T> for AsyncSubject<T> {
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

impl<T: Clone + Send + 'static> SubjectLike<T> for AsyncSubject<T> {
    fn as_observable(&self) -> Observable<T> {
        AsyncSubject::as_observable(self)
    }
}

impl<T: Send + 'static> Disposable for AsyncSubject<T> {
    fn dispose(&self) {
        self.hub.dispose_with(|last| *last = None);
    }

    fn is_disposed(&self) -> bool {
        self.hub.is_disposed()
    }
}
