use std::sync::Arc;

use parking_lot::Mutex;

use super::{Recorded, Subscription};
use crate::disposables;
use crate::observable::Observable;
use crate::observers::ObserverRef;
use crate::scheduler::{SchedulerExt, Timestamp, VirtualTimeScheduler};

struct Shared<T> {
    observers: Vec<(u64, ObserverRef<T>)>,
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

/// Test observable that emits its messages at absolute virtual times,
/// whether or not anyone is subscribed.
pub struct HotObservable<T> {
    scheduler: VirtualTimeScheduler,
    shared: Arc<Mutex<Shared<T>>>,
}

impl<T: Clone + Send + 'static> HotObservable<T> {
    /// Schedules every message on `scheduler` at its recorded time.
    #[must_use]
    pub fn new(scheduler: &VirtualTimeScheduler, messages: Vec<Recorded<T>>) -> Self {
        let shared = Arc::new(Mutex::new(Shared {
            observers: Vec::new(),
            next_id: 0,
            subscriptions: Vec::new(),
        }));
        for message in messages {
            let shared = Arc::clone(&shared);
            let at = Timestamp::from_secs_f64(message.time);
            let scheduled = scheduler.schedule_absolute_fn(at, move |_| {
                let targets: Vec<ObserverRef<T>> =
                    shared.lock().observers.iter().map(|(_, o)| Arc::clone(o)).collect();
                for observer in targets {
                    message.value.clone().accept(observer.as_ref());
                }
                Ok(None)
            });
            if let Err(err) = scheduled {
                tracing::warn!(label = err.as_label(), "hot message not scheduled: {err}");
            }
        }
        Self {
            scheduler: scheduler.clone(),
            shared,
        }
    }

    /// Subscription log, one entry per subscribe.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.shared.lock().subscriptions.clone()
    }

    #[must_use]
    pub fn as_observable(&self) -> Observable<T> {
        let shared = Arc::clone(&self.shared);
        let scheduler = self.scheduler.clone();
        Observable::create(move |observer, _| {
            let (id, index) = {
                let mut state = shared.lock();
                let id = state.next_id;
                state.next_id += 1;
                state.observers.push((id, observer));
                state.subscriptions.push(Subscription::open(scheduler.ticks()));
                (id, state.subscriptions.len() - 1)
            };
            let shared = Arc::clone(&shared);
            let scheduler = scheduler.clone();
            disposables::from_fn(move || {
                let mut state = shared.lock();
                state.observers.retain(|(other, _)| *other != id);
                state.subscriptions[index].unsubscribe = scheduler.ticks();
            })
        })
    }
}
