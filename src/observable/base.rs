use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};
use std::sync::Arc;

use crate::disposables::{CompositeDisposable, DisposableRef};
use crate::error::RxError;
use crate::observers::{AnonymousObserver, AutoDetachObserver, Observer, ObserverRef};
use crate::scheduler::{CurrentThreadScheduler, Scheduler, SchedulerRef};

/// The subscription function that defines an observable.
///
/// It receives the (already wrapped) observer and the scheduler the caller
/// subscribed with, starts producing and returns the resources to release.
pub type SubscribeFn<T> =
    dyn Fn(ObserverRef<T>, Option<&SchedulerRef>) -> DisposableRef + Send + Sync + 'static;

/// A push-based sequence defined by its subscription function.
///
/// Cloning is cheap and yields the same definition: every `subscribe` runs
/// the function again (a cold sequence) unless the function itself shares
/// state (subjects, `share`).
pub struct Observable<T> {
    subscribe: Arc<SubscribeFn<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            subscribe: Arc::clone(&self.subscribe),
        }
    }
}

impl<T: Send + 'static> Observable<T> {
    /// Observable whose subscriptions run `subscribe`.
    ///
    /// # Example
    /// ```
    /// use rxfabric::{Observable, Observer, disposables};
    ///
    /// let source = Observable::create(|observer, _scheduler| {
    ///     observer.on_next(1);
    ///     observer.on_completed();
    ///     disposables::empty()
    /// });
    /// let sub = source.subscribe_fn(|v: i32| assert_eq!(v, 1));
    /// assert!(sub.is_disposed());
    /// ```
    #[must_use]
    pub fn create<F>(subscribe: F) -> Self
    where
        F: Fn(ObserverRef<T>, Option<&SchedulerRef>) -> DisposableRef + Send + Sync + 'static,
    {
        Self {
            subscribe: Arc::new(subscribe),
        }
    }

    /// Subscribes `observer`; disposing the result detaches it.
    pub fn subscribe<O>(&self, observer: O) -> DisposableRef
    where
        O: Observer<T> + 'static,
    {
        self.subscribe_arc(Arc::new(observer))
    }

    /// Subscribes a shared observer.
    pub fn subscribe_arc(&self, observer: ObserverRef<T>) -> DisposableRef {
        self.subscribe_core(observer, None)
    }

    /// Subscribes with an `on_next` callback; an error reaching it panics.
    pub fn subscribe_fn<F>(&self, on_next: F) -> DisposableRef
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.subscribe(AnonymousObserver::new(on_next))
    }

    /// Subscribes `observer`, dispatching the subscription itself through
    /// `scheduler`. The scheduler is also handed to the subscription
    /// function as the default for the work it schedules.
    pub fn subscribe_with(&self, observer: ObserverRef<T>, scheduler: SchedulerRef) -> DisposableRef {
        self.subscribe_core(observer, Some(scheduler))
    }

    /// Observable whose subscriptions are dispatched through `scheduler`.
    #[must_use]
    pub fn subscribe_on(&self, scheduler: SchedulerRef) -> Observable<T> {
        let source = self.clone();
        Observable::create(move |observer, _| source.subscribe_with(observer, Arc::clone(&scheduler)))
    }

    fn subscribe_core(&self, observer: ObserverRef<T>, scheduler: Option<SchedulerRef>) -> DisposableRef {
        let auto = Arc::new(AutoDetachObserver::new(observer));
        let attach = {
            let auto = Arc::clone(&auto);
            let subscribe = Arc::clone(&self.subscribe);
            move |scheduler: Option<&SchedulerRef>| {
                let downstream: ObserverRef<T> = auto.clone();
                match catch_unwind(AssertUnwindSafe(|| subscribe(downstream, scheduler))) {
                    Ok(resources) => {
                        if let Err(err) = auto.set_subscription(resources) {
                            tracing::warn!(label = err.as_label(), "subscription resources dropped: {err}");
                        }
                    }
                    Err(payload) => {
                        // Undeliverable panics (raised by a terminal handler) keep unwinding.
                        if !auto.fail(RxError::from_panic(payload.as_ref())) {
                            resume_unwind(payload);
                        }
                    }
                }
            }
        };

        match scheduler {
            Some(scheduler) => {
                let on = Arc::clone(&scheduler);
                let scheduled = scheduler.schedule(Box::new(move |_| {
                    attach(Some(&on));
                    Ok(None)
                }));
                match scheduled {
                    Ok(handle) => {
                        let composite = CompositeDisposable::from_vec(vec![handle, auto as DisposableRef]);
                        Arc::new(composite)
                    }
                    Err(err) => {
                        auto.fail(err);
                        auto
                    }
                }
            }
            None if CurrentThreadScheduler::schedule_required() => {
                let scheduled = CurrentThreadScheduler::singleton().schedule(Box::new(move |_| {
                    attach(None);
                    Ok(None)
                }));
                if let Err(err) = scheduled {
                    auto.fail(err);
                }
                auto
            }
            None => {
                attach(None);
                auto
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disposables::{self, BooleanDisposable, Disposable};
    use crate::scheduler::{SchedulerExt, VirtualTimeScheduler};
    use parking_lot::Mutex;
    use std::time::Duration;

    fn tracer() -> (Arc<Mutex<Vec<String>>>, AnonymousObserver<i32>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
        let obs = AnonymousObserver::new(move |v| a.lock().push(format!("N({v})")))
            .with_error(move |e: RxError| b.lock().push(format!("E({})", e.as_label())))
            .with_completed(move || c.lock().push("C".to_string()));
        (log, obs)
    }

    #[test]
    fn test_terminal_releases_resources() {
        let resource = Arc::new(BooleanDisposable::new());
        let r = Arc::clone(&resource);
        let source = Observable::create(move |observer, _| {
            observer.on_next(1);
            observer.on_completed();
            r.clone() as DisposableRef
        });
        let (log, obs) = tracer();
        let sub = source.subscribe(obs);

        assert_eq!(*log.lock(), vec!["N(1)", "C"]);
        assert!(resource.is_disposed(), "terminal-detach");
        assert!(sub.is_disposed());
    }

    #[test]
    fn test_dispose_releases_resources() {
        let resource = Arc::new(BooleanDisposable::new());
        let r = Arc::clone(&resource);
        let source = Observable::<i32>::create(move |_, _| r.clone() as DisposableRef);
        let (_log, obs) = tracer();
        let sub = source.subscribe(obs);

        assert!(!resource.is_disposed());
        sub.dispose();
        assert!(resource.is_disposed(), "auto-detach");
    }

    #[test]
    fn test_panicking_subscribe_becomes_on_error() {
        let source = Observable::<i32>::create(|_, _| panic!("broken producer"));
        let (log, obs) = tracer();
        let _sub = source.subscribe(obs);
        assert_eq!(*log.lock(), vec!["E(panicked)"]);
    }

    #[test]
    fn test_grammar_enforced_for_misbehaving_producer() {
        let source = Observable::create(|observer, _| {
            observer.on_completed();
            observer.on_next(5);
            observer.on_error(RxError::failure("late"));
            disposables::empty()
        });
        let (log, obs) = tracer();
        let _sub = source.subscribe(obs);
        assert_eq!(*log.lock(), vec!["C"]);
    }

    #[test]
    fn test_scheduled_subscription_waits_for_scheduler() {
        let vts = VirtualTimeScheduler::new();
        let seen_scheduler = Arc::new(Mutex::new(false));
        let s = Arc::clone(&seen_scheduler);
        let source = Observable::create(move |observer, scheduler| {
            *s.lock() = scheduler.is_some();
            observer.on_next(9);
            disposables::empty()
        });
        let (log, obs) = tracer();
        let sub = source.subscribe_with(Arc::new(obs), Arc::new(vts.clone()));

        assert!(log.lock().is_empty());
        vts.start().expect("run");
        assert_eq!(*log.lock(), vec!["N(9)"]);
        assert!(*seen_scheduler.lock(), "scheduler handed to the subscription function");
        sub.dispose();
    }

    #[test]
    fn test_dispose_before_scheduled_subscription_cancels_it() {
        let vts = VirtualTimeScheduler::new();
        let ran = Arc::new(Mutex::new(false));
        let r = Arc::clone(&ran);
        let source = Observable::<i32>::create(move |_, _| {
            *r.lock() = true;
            disposables::empty()
        });
        let (_log, obs) = tracer();
        let sub = source.subscribe_with(Arc::new(obs), Arc::new(vts.clone()));
        sub.dispose();
        vts.start().expect("run");
        assert!(!*ran.lock());
    }

    #[test]
    fn test_default_subscription_runs_on_trampoline() {
        let inside = Arc::new(Mutex::new(None));
        let i = Arc::clone(&inside);
        let source = Observable::<i32>::create(move |_, _| {
            *i.lock() = Some(CurrentThreadScheduler::schedule_required());
            disposables::empty()
        });
        let _sub = source.subscribe_fn(|_| {});
        assert_eq!(*inside.lock(), Some(false), "trampoline is running during subscribe");
    }

    #[test]
    fn test_self_dispose_from_on_next() {
        let source = Observable::create(move |observer: ObserverRef<i32>, _| {
            CurrentThreadScheduler::singleton()
                .schedule_relative_fn(Duration::ZERO, move |_| {
                    (1..=5).for_each(|v| observer.on_next(v));
                    Ok(None)
                })
                .unwrap_or_else(|_| disposables::empty())
        });
        let slot: Arc<Mutex<Option<DisposableRef>>> = Arc::new(Mutex::new(None));
        let s = Arc::clone(&slot);
        let hits = Arc::new(Mutex::new(Vec::new()));
        let h = Arc::clone(&hits);

        // Installing the handle before the trampoline drains needs an outer action.
        CurrentThreadScheduler::singleton()
            .schedule_fn(move |_| {
                let sub = source.subscribe_fn(move |v| {
                    h.lock().push(v);
                    if v == 2 {
                        if let Some(me) = s.lock().clone() {
                            me.dispose();
                        }
                    }
                });
                *slot.lock() = Some(sub);
                Ok(None)
            })
            .expect("schedule");

        assert_eq!(*hits.lock(), vec![1, 2]);
    }
}
