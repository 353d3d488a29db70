use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{Recorded, Subscription};
use crate::disposables::{self, CompositeDisposable, Disposable};
use crate::observable::Observable;
use crate::scheduler::{SchedulerExt, VirtualTimeScheduler};

/// Test observable that replays its messages, relative to the moment of
/// subscription, for every subscriber.
pub struct ColdObservable<T> {
    scheduler: VirtualTimeScheduler,
    messages: Arc<Vec<Recorded<T>>>,
    subscriptions: Arc<Mutex<Vec<Subscription>>>,
}

impl<T: Clone + Send + Sync + 'static> ColdObservable<T> {
    #[must_use]
    pub fn new(scheduler: &VirtualTimeScheduler, messages: Vec<Recorded<T>>) -> Self {
        Self {
            scheduler: scheduler.clone(),
            messages: Arc::new(messages),
            subscriptions: Arc::default(),
        }
    }

    /// Subscription log, one entry per subscribe.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions.lock().clone()
    }

    #[must_use]
    pub fn as_observable(&self) -> Observable<T> {
        let scheduler = self.scheduler.clone();
        let messages = Arc::clone(&self.messages);
        let log = Arc::clone(&self.subscriptions);
        Observable::create(move |observer, _| {
            let index = {
                let mut log = log.lock();
                log.push(Subscription::open(scheduler.ticks()));
                log.len() - 1
            };
            let pending = Arc::new(CompositeDisposable::new());
            for message in messages.iter() {
                let notification = message.value.clone();
                let observer = Arc::clone(&observer);
                let delay = Duration::from_secs_f64(message.time.max(0.0));
                match scheduler.schedule_relative_fn(delay, move |_| {
                    notification.accept(observer.as_ref());
                    Ok(None)
                }) {
                    Ok(handle) => pending.add(handle),
                    Err(err) => tracing::warn!(label = err.as_label(), "cold message not scheduled: {err}"),
                }
            }

            let log = Arc::clone(&log);
            let scheduler = scheduler.clone();
            disposables::from_fn(move || {
                log.lock()[index].unsubscribe = scheduler.ticks();
                pending.dispose();
            })
        })
    }
}
