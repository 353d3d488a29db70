use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::{Handle, Runtime};

use super::thread_factory::ThreadWork;
use super::{
    NewThreadScheduler, PeriodicAction, ScheduledAction, Scheduler, ThreadFactory, Timestamp,
};
use crate::config::Config;
use crate::disposables::DisposableRef;
use crate::error::RxError;

/// Thread factory that runs work on a tokio blocking pool.
struct PoolFactory {
    handle: Handle,
}

impl ThreadFactory for PoolFactory {
    fn spawn(&self, _name: &str, work: ThreadWork) -> Result<(), RxError> {
        // The join handle is dropped: pool workers are detached like OS threads.
        drop(self.handle.spawn_blocking(work));
        Ok(())
    }
}

/// Owns the runtime; shuts it down without waiting for parked workers.
struct PoolRuntime {
    runtime: Option<Runtime>,
}

impl Drop for PoolRuntime {
    fn drop(&mut self) {
        if let Some(rt) = self.runtime.take() {
            rt.shutdown_background();
        }
    }
}

/// [`NewThreadScheduler`] whose workers come from a bounded pool.
///
/// The pool is a dedicated tokio runtime whose blocking pool is limited to
/// `Config::pool_size` threads; each unit of work becomes a short-lived event
/// loop on one of them. Work beyond the limit waits for a free thread.
#[derive(Clone)]
pub struct ThreadPoolScheduler {
    inner: NewThreadScheduler,
    max_workers: usize,
    _runtime: Arc<PoolRuntime>,
}

impl ThreadPoolScheduler {
    /// Pool sized by the available parallelism.
    pub fn new() -> Result<Self, RxError> {
        Self::with_config(&Config::default())
    }

    pub fn with_config(cfg: &Config) -> Result<Self, RxError> {
        let max_workers = cfg.pool_size_resolved();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(max_workers)
            .thread_name(cfg.thread_name.clone())
            .enable_time()
            .build()
            .map_err(|e| RxError::ThreadSpawn {
                error: e.to_string(),
            })?;
        let factory = Arc::new(PoolFactory {
            handle: runtime.handle().clone(),
        });
        tracing::debug!(max_workers, "thread pool scheduler created");
        Ok(Self {
            inner: NewThreadScheduler::with_factory(cfg, factory),
            max_workers,
            _runtime: Arc::new(PoolRuntime {
                runtime: Some(runtime),
            }),
        })
    }

    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }
}

impl Scheduler for ThreadPoolScheduler {
    fn schedule(&self, action: ScheduledAction) -> Result<DisposableRef, RxError> {
        self.inner.schedule(action)
    }

    fn schedule_relative(
        &self,
        delay: Duration,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        self.inner.schedule_relative(delay, action)
    }

    fn schedule_absolute(
        &self,
        duetime: Timestamp,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        self.inner.schedule_absolute(duetime, action)
    }

    fn schedule_periodic(
        &self,
        period: Duration,
        action: PeriodicAction,
    ) -> Result<DisposableRef, RxError> {
        self.inner.schedule_periodic(period, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SchedulerExt;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn test_work_runs_off_the_caller_thread() {
        let pool = ThreadPoolScheduler::with_config(&Config {
            pool_size: 2,
            ..Config::default()
        })
        .expect("pool");
        assert_eq!(pool.max_workers(), 2);

        let (tx, rx) = mpsc::channel();
        for i in 0..4 {
            let tx = tx.clone();
            pool.schedule_fn(move |_| {
                let _ = tx.send((i, thread::current().id()));
                Ok(None)
            })
            .expect("schedule");
        }
        let got: Vec<_> = (0..4)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).expect("ran"))
            .collect();
        let values: HashSet<_> = got.iter().map(|(i, _)| *i).collect();
        assert_eq!(values.len(), 4);
        assert!(got.iter().all(|(_, id)| *id != thread::current().id()));
    }

    #[test]
    fn test_pool_bounds_concurrency() {
        let pool = ThreadPoolScheduler::with_config(&Config {
            pool_size: 2,
            ..Config::default()
        })
        .expect("pool");
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();

        for _ in 0..6 {
            let (a, p, tx) = (Arc::clone(&active), Arc::clone(&peak), tx.clone());
            pool.schedule_fn(move |_| {
                let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                p.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(15));
                a.fetch_sub(1, Ordering::SeqCst);
                let _ = tx.send(());
                Ok(None)
            })
            .expect("schedule");
        }
        for _ in 0..6 {
            rx.recv_timeout(Duration::from_secs(5)).expect("ran");
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
