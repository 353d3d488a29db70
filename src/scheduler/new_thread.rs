use std::sync::Arc;
use std::time::Duration;

use super::{
    EventLoopScheduler, PeriodicAction, ScheduledAction, Scheduler, StdThreadFactory,
    ThreadFactory, Timestamp,
};
use crate::config::Config;
use crate::disposables::{self, DisposableRef};
use crate::error::RxError;
use crate::internal::Signal;

/// Runs each action on its own short-lived thread.
///
/// Every `schedule*` call builds a fresh [`EventLoopScheduler`] with
/// `exit_if_empty = true` and forwards to it, so the worker exits once its
/// single action (and anything it re-schedules onto that loop) is done.
///
/// Periodic work gets one dedicated thread that sleeps between runs and stops
/// when the returned disposable is disposed or the body returns `Err`.
#[derive(Clone)]
pub struct NewThreadScheduler {
    cfg: Config,
    factory: Arc<dyn ThreadFactory>,
}

impl Default for NewThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl NewThreadScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    #[must_use]
    pub fn with_config(cfg: &Config) -> Self {
        Self::with_factory(cfg, Arc::new(StdThreadFactory))
    }

    /// Scheduler whose threads are started by `factory`.
    #[must_use]
    pub fn with_factory(cfg: &Config, factory: Arc<dyn ThreadFactory>) -> Self {
        let cfg = Config {
            exit_if_empty: true,
            ..cfg.clone()
        };
        Self { cfg, factory }
    }

    fn fresh_loop(&self) -> EventLoopScheduler {
        EventLoopScheduler::with_factory(&self.cfg, Arc::clone(&self.factory))
    }
}

impl Scheduler for NewThreadScheduler {
    fn schedule(&self, action: ScheduledAction) -> Result<DisposableRef, RxError> {
        self.fresh_loop().schedule(action)
    }

    fn schedule_relative(
        &self,
        delay: Duration,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        self.fresh_loop().schedule_relative(delay, action)
    }

    fn schedule_absolute(
        &self,
        duetime: Timestamp,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        self.fresh_loop().schedule_absolute(duetime, action)
    }

    fn schedule_periodic(
        &self,
        period: Duration,
        mut action: PeriodicAction,
    ) -> Result<DisposableRef, RxError> {
        let stop = Arc::new(Signal::new());
        let stopped = Arc::clone(&stop);
        let name = self.cfg.thread_name.clone();

        self.factory.spawn(
            &self.cfg.thread_name,
            Box::new(move || {
                let mut timeout = period;
                loop {
                    if timeout > Duration::ZERO && stopped.wait_timeout(timeout) {
                        break;
                    }
                    if stopped.is_set() {
                        break;
                    }
                    let started = Timestamp::now();
                    if let Err(err) = action() {
                        tracing::error!(error = %err, thread = %name, "periodic action failed; stopping");
                        break;
                    }
                    let elapsed = Timestamp::now().saturating_duration_since(started);
                    timeout = period.saturating_sub(elapsed);
                }
            }),
        )?;

        Ok(disposables::from_fn(move || stop.set()))
    }
}
