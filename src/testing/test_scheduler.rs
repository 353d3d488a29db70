use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{ColdObservable, HotObservable, MockObserver, Recorded, CREATED, DISPOSED, SUBSCRIBED};
use crate::disposables::{Disposable, DisposableRef};
use crate::error::RxError;
use crate::observable::Observable;
use crate::scheduler::{
    ActionResult, PeriodicAction, ScheduledAction, Scheduler, SchedulerExt, SchedulerRef, Timestamp,
    VirtualTimeScheduler, to_duration,
};

/// Virtual-time scheduler for tests, with time expressed in float ticks.
///
/// ```text
/// t=100 (created)     create the observable under test
/// t=200 (subscribed)  subscribe a MockObserver to it
/// t=1000 (disposed)   dispose the subscription
/// ```
#[derive(Clone, Default)]
pub struct TestScheduler {
    clock: VirtualTimeScheduler,
}

impl TestScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying virtual clock.
    #[must_use]
    pub fn virtual_time(&self) -> &VirtualTimeScheduler {
        &self.clock
    }

    /// Current virtual time in ticks.
    #[must_use]
    pub fn ticks(&self) -> f64 {
        self.clock.ticks()
    }

    /// Schedules `action` at absolute tick `ticks`.
    pub fn schedule_at<F>(&self, ticks: f64, action: F) -> Result<DisposableRef, RxError>
    where
        F: FnOnce(&dyn Scheduler) -> ActionResult + Send + 'static,
    {
        self.clock.schedule_absolute_fn(Timestamp::from_secs_f64(ticks), action)
    }

    /// Runs everything queued.
    pub fn start(&self) -> Result<(), RxError> {
        self.clock.start()
    }

    pub fn stop(&self) {
        self.clock.stop();
    }

    pub fn advance_to(&self, ticks: f64) -> Result<(), RxError> {
        self.clock.advance_to(Timestamp::from_secs_f64(ticks))
    }

    pub fn advance_by(&self, ticks: f64) -> Result<(), RxError> {
        self.clock.advance_by(to_duration(ticks))
    }

    /// [`start_with_times`](Self::start_with_times) at 100 / 200 / 1000.
    pub fn start_with<T, F>(&self, create: F) -> Result<MockObserver<T>, RxError>
    where
        T: Send + 'static,
        F: FnOnce() -> Observable<T> + Send + 'static,
    {
        self.start_with_times(create, CREATED, SUBSCRIBED, DISPOSED)
    }

    /// Creates the observable at `created`, subscribes a recorder at
    /// `subscribed`, disposes it at `disposed`, and runs the clock.
    pub fn start_with_times<T, F>(
        &self,
        create: F,
        created: f64,
        subscribed: f64,
        disposed: f64,
    ) -> Result<MockObserver<T>, RxError>
    where
        T: Send + 'static,
        F: FnOnce() -> Observable<T> + Send + 'static,
    {
        let observer = self.create_observer();
        let source: Arc<Mutex<Option<Observable<T>>>> = Arc::default();
        let subscription: Arc<Mutex<Option<DisposableRef>>> = Arc::default();

        let slot = Arc::clone(&source);
        self.schedule_at(created, move |_| {
            *slot.lock() = Some(create());
            Ok(None)
        })?;

        let (slot, sub, recorder) = (Arc::clone(&source), Arc::clone(&subscription), observer.clone());
        let me: SchedulerRef = Arc::new(self.clone());
        self.schedule_at(subscribed, move |_| {
            let created = slot.lock().take();
            if let Some(source) = created {
                let handle = source.subscribe_with(Arc::new(recorder), me);
                *sub.lock() = Some(handle);
            }
            Ok(None)
        })?;

        self.schedule_at(disposed, move |_| {
            let handle = subscription.lock().take();
            if let Some(handle) = handle {
                handle.dispose();
            }
            Ok(None)
        })?;

        self.start()?;
        Ok(observer)
    }

    #[must_use]
    pub fn create_observer<T>(&self) -> MockObserver<T> {
        MockObserver::new(self.clock.clone())
    }

    /// Observable emitting `messages` at their absolute times.
    #[must_use]
    pub fn create_hot_observable<T>(&self, messages: Vec<Recorded<T>>) -> HotObservable<T>
    where
        T: Clone + Send + 'static,
    {
        HotObservable::new(&self.clock, messages)
    }

    /// Observable emitting `messages` at offsets from each subscription.
    #[must_use]
    pub fn create_cold_observable<T>(&self, messages: Vec<Recorded<T>>) -> ColdObservable<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        ColdObservable::new(&self.clock, messages)
    }
}

impl Scheduler for TestScheduler {
    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn schedule(&self, action: ScheduledAction) -> Result<DisposableRef, RxError> {
        self.clock.schedule(action)
    }

    fn schedule_relative(&self, delay: Duration, action: ScheduledAction) -> Result<DisposableRef, RxError> {
        self.clock.schedule_relative(delay, action)
    }

    fn schedule_absolute(&self, duetime: Timestamp, action: ScheduledAction) -> Result<DisposableRef, RxError> {
        self.clock.schedule_absolute(duetime, action)
    }

    fn schedule_periodic(&self, period: Duration, action: PeriodicAction) -> Result<DisposableRef, RxError> {
        self.clock.schedule_periodic(period, action)
    }
}
