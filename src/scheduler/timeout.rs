//! # TimeoutScheduler
//!
//! Process-wide timer scheduler. Every action gets its own timer, even with a
//! zero delay, so nothing ever runs inline on the caller.
//!
//! ```text
//! schedule_relative(delay) ─► spawn on timer runtime:
//!     select! {
//!         token.cancelled()  ─► drop the action
//!         sleep(delay)       ─► spawn_blocking(run action unless disposed)
//!     }
//! returned handle = Composite(item slot, cancel token)
//! ```
//!
//! Timers live on a lazily built tokio runtime that is never shut down, so
//! pending timers do not keep the process alive past `main`.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use super::{ScheduledAction, Scheduler, Timestamp, invoke_action};
use crate::disposables::{
    self, CompositeDisposable, Disposable, DisposableRef, SingleAssignmentDisposable,
};
use crate::error::RxError;

static TIMER_RUNTIME: OnceLock<Result<Runtime, String>> = OnceLock::new();

fn timer_runtime() -> Result<&'static Runtime, RxError> {
    let built = TIMER_RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("rx-timeout")
            .enable_time()
            .build()
            .map_err(|e| e.to_string())
    });
    built.as_ref().map_err(|e| RxError::ThreadSpawn { error: e.clone() })
}

/// Timer-backed scheduler shared by the whole process.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeoutScheduler;

impl TimeoutScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn singleton() -> Self {
        Self
    }
}

impl Scheduler for TimeoutScheduler {
    fn schedule(&self, action: ScheduledAction) -> Result<DisposableRef, RxError> {
        self.schedule_relative(Duration::ZERO, action)
    }

    fn schedule_relative(
        &self,
        delay: Duration,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        let rt = timer_runtime()?;
        let slot = Arc::new(SingleAssignmentDisposable::new());
        let token = CancellationToken::new();

        let result_slot = Arc::clone(&slot);
        let cancelled = token.clone();
        rt.spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    drop(tokio::task::spawn_blocking(move || {
                        if result_slot.is_disposed() {
                            return;
                        }
                        match invoke_action(&TimeoutScheduler, action) {
                            Ok(d) => {
                                let _ = result_slot.set(d);
                            }
                            Err(err) => {
                                tracing::error!(error = %err, label = err.as_label(), "timer action failed");
                            }
                        }
                    }));
                }
            }
        });

        Ok(Arc::new(CompositeDisposable::from_vec(vec![
            slot as DisposableRef,
            disposables::from_fn(move || token.cancel()),
        ])))
    }

    fn schedule_absolute(
        &self,
        duetime: Timestamp,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        let delay = duetime.saturating_duration_since(self.now());
        self.schedule_relative(delay, action)
    }
}
