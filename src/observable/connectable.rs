use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::Observable;
use crate::disposables::{self, CompositeDisposable, Disposable, DisposableRef, SingleAssignmentDisposable};
use crate::observers::{Observer, ObserverRef};
use crate::scheduler::{CurrentThreadScheduler, SchedulerRef};
use crate::subjects::{BehaviorSubject, ReplaySubject, Subject, SubjectLike};

#[derive(Default)]
struct Connection {
    current: Option<DisposableRef>,
    generation: u64,
}

/// An observable whose upstream subscription waits for [`connect`](Self::connect).
///
/// Subscribers attach to an intermediate subject; `connect` subscribes that
/// subject to the source, so every subscriber shares one upstream
/// subscription.
///
/// ```text
///   source ──connect()──► subject ──┬──► subscriber A
///                                   └──► subscriber B
/// ```
pub struct ConnectableObservable<T> {
    source: Observable<T>,
    observer: ObserverRef<T>,
    observable: Observable<T>,
    connection: Arc<Mutex<Connection>>,
}

impl<T> Clone for ConnectableObservable<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            observer: Arc::clone(&self.observer),
            observable: self.observable.clone(),
            connection: Arc::clone(&self.connection),
        }
    }
}

impl<T: Send + 'static> ConnectableObservable<T> {
    /// Pairs `source` with `subject`.
    #[must_use]
    pub fn new<S>(source: Observable<T>, subject: S) -> Self
    where
        S: SubjectLike<T> + 'static,
    {
        let observable = subject.as_observable();
        Self {
            source,
            observer: Arc::new(subject),
            observable,
            connection: Arc::default(),
        }
    }

    /// Subscribes the subject to the source.
    ///
    /// While connected, further calls return the same handle. Disposing the
    /// handle tears the upstream subscription down; the next `connect`
    /// subscribes afresh.
    pub fn connect(&self) -> DisposableRef {
        let (slot, handle) = {
            let mut state = self.connection.lock();
            if let Some(current) = &state.current {
                return Arc::clone(current);
            }
            state.generation += 1;
            let generation = state.generation;
            let weak = Arc::downgrade(&self.connection);
            let slot = Arc::new(SingleAssignmentDisposable::new());
            let release = disposables::from_fn(move || {
                if let Some(connection) = weak.upgrade() {
                    let mut state = connection.lock();
                    if state.generation == generation {
                        state.current = None;
                    }
                }
            });
            let handle: DisposableRef = Arc::new(CompositeDisposable::from_vec(vec![
                Arc::clone(&slot) as DisposableRef,
                release,
            ]));
            state.current = Some(Arc::clone(&handle));
            (slot, handle)
        };

        tracing::debug!("connecting to source");
        let upstream = self.source.subscribe_arc(Arc::clone(&self.observer));
        if let Err(err) = slot.set(upstream) {
            tracing::warn!(label = err.as_label(), "connection handle already assigned");
        }
        handle
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.lock().current.is_some()
    }

    /// The subscribe side: subscribers attach to the subject.
    #[must_use]
    pub fn as_observable(&self) -> Observable<T> {
        self.observable.clone()
    }

    pub fn subscribe<O>(&self, observer: O) -> DisposableRef
    where
        O: Observer<T> + 'static,
    {
        self.observable.subscribe(observer)
    }

    /// Observable that connects on its first subscriber and disconnects
    /// when its last subscriber leaves.
    ///
    /// A subscriber arriving after the connection was torn down connects
    /// again.
    #[must_use]
    pub fn ref_count(&self) -> Observable<T> {
        let connectable = self.clone();
        let shared: Arc<Mutex<RefCountState>> = Arc::default();
        Observable::create(move |observer, _| {
            let first = {
                let mut state = shared.lock();
                state.subscribers += 1;
                state.subscribers == 1
            };
            let subscription = connectable.observable.subscribe_arc(observer);
            if first {
                tracing::debug!("first subscriber; connecting");
                let connection = connectable.connect();
                shared.lock().connection = Some(connection);
            }

            let shared = Arc::clone(&shared);
            disposables::from_fn(move || {
                subscription.dispose();
                let teardown = {
                    let mut state = shared.lock();
                    state.subscribers = state.subscribers.saturating_sub(1);
                    if state.subscribers == 0 {
                        state.connection.take()
                    } else {
                        None
                    }
                };
                if let Some(connection) = teardown {
                    tracing::debug!("last subscriber left; disconnecting");
                    connection.dispose();
                }
            })
        })
    }
}

#[derive(Default)]
struct RefCountState {
    subscribers: usize,
    connection: Option<DisposableRef>,
}

impl<T: Clone + Send + 'static> Observable<T> {
    /// Shares this sequence through `subject`.
    #[must_use]
    pub fn multicast<S>(&self, subject: S) -> ConnectableObservable<T>
    where
        S: SubjectLike<T> + 'static,
    {
        ConnectableObservable::new(self.clone(), subject)
    }

    /// Shares through a plain [`Subject`].
    #[must_use]
    pub fn publish(&self) -> ConnectableObservable<T> {
        self.multicast(Subject::new())
    }

    /// Shares through a [`BehaviorSubject`] seeded with `seed`.
    #[must_use]
    pub fn publish_value(&self, seed: T) -> ConnectableObservable<T> {
        self.multicast(BehaviorSubject::new(seed))
    }

    /// Shares through a [`ReplaySubject`]; the window is measured on
    /// `scheduler` (the current-thread clock when `None`).
    #[must_use]
    pub fn replay(
        &self,
        buffer_size: Option<usize>,
        window: Option<Duration>,
        scheduler: Option<SchedulerRef>,
    ) -> ConnectableObservable<T> {
        let scheduler = scheduler.unwrap_or_else(|| Arc::new(CurrentThreadScheduler::singleton()));
        self.multicast(ReplaySubject::new(buffer_size, window, scheduler))
    }

    /// `publish().ref_count()`: one upstream subscription shared by all
    /// current subscribers.
    #[must_use]
    pub fn share(&self) -> Observable<T> {
        self.publish().ref_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RxError;
    use crate::observers::AnonymousObserver;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source that counts live upstream subscriptions and never terminates.
    fn counted() -> (Arc<AtomicUsize>, Arc<AtomicUsize>, Observable<i32>) {
        let live = Arc::new(AtomicUsize::new(0));
        let total = Arc::new(AtomicUsize::new(0));
        let (l, t) = (Arc::clone(&live), Arc::clone(&total));
        let source = Observable::create(move |_, _| {
            l.fetch_add(1, Ordering::SeqCst);
            t.fetch_add(1, Ordering::SeqCst);
            let l = Arc::clone(&l);
            disposables::from_fn(move || {
                l.fetch_sub(1, Ordering::SeqCst);
            })
        });
        (live, total, source)
    }

    #[test]
    fn test_nothing_flows_before_connect() {
        let connectable = Observable::of(vec![1, 2]).publish();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let _sub = connectable.subscribe(AnonymousObserver::new(move |v: i32| s.lock().push(v)));
        assert!(seen.lock().is_empty());

        connectable.connect();
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[test]
    fn test_connect_is_idempotent_while_connected() {
        let (live, total, source) = counted();
        let connectable = source.publish();
        let first = connectable.connect();
        let second = connectable.connect();
        assert!(disposables::same(&first, &second));
        assert_eq!(total.load(Ordering::SeqCst), 1);

        first.dispose();
        assert_eq!(live.load(Ordering::SeqCst), 0);
        assert!(!connectable.is_connected());

        let third = connectable.connect();
        assert_eq!(total.load(Ordering::SeqCst), 2, "fresh upstream after teardown");
        third.dispose();
    }

    #[test]
    fn test_ref_count_lifecycle() {
        let (live, _, source) = counted();
        let shared = source.publish().ref_count();

        let a = shared.subscribe_fn(|_| {});
        assert_eq!(live.load(Ordering::SeqCst), 1);
        let b = shared.subscribe_fn(|_| {});
        assert_eq!(live.load(Ordering::SeqCst), 1);
        a.dispose();
        assert_eq!(live.load(Ordering::SeqCst), 1);
        b.dispose();
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_ref_count_reconnects() {
        let (live, total, source) = counted();
        let shared = source.share();

        shared.subscribe_fn(|_| {}).dispose();
        let again = shared.subscribe_fn(|_| {});
        assert_eq!(total.load(Ordering::SeqCst), 2);
        assert_eq!(live.load(Ordering::SeqCst), 1);
        again.dispose();
    }

    #[test]
    fn test_publish_value_and_replay() {
        let upstream = Subject::new();
        let behavior = upstream.as_observable().publish_value(0);
        let replay = upstream.as_observable().replay(Some(1), None, None);
        let (_c1, _c2) = (behavior.connect(), replay.connect());

        upstream.on_next(5);
        upstream.on_next(6);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let (s1, s2) = (Arc::clone(&seen), Arc::clone(&seen));
        let _b = behavior.subscribe(AnonymousObserver::new(move |v: i32| s1.lock().push(("behavior", v))));
        let _r = replay.subscribe(AnonymousObserver::new(move |v: i32| s2.lock().push(("replay", v))));
        assert_eq!(*seen.lock(), vec![("behavior", 6), ("replay", 6)]);
    }

    #[test]
    fn test_errors_reach_every_subscriber() {
        let shared = Observable::<i32>::throw(RxError::failure("down")).publish();
        let hits = Arc::new(AtomicUsize::new(0));
        let subs: Vec<_> = (0..3)
            .map(|_| {
                let h = Arc::clone(&hits);
                shared.subscribe(AnonymousObserver::new(|_: i32| {}).with_error(move |_| {
                    h.fetch_add(1, Ordering::SeqCst);
                }))
            })
            .collect();
        shared.connect();
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert!(subs.iter().all(|s| s.is_disposed()));
    }
}
