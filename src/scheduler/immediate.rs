use std::sync::{Arc, OnceLock};
use std::time::Duration;

use super::{ScheduledAction, Scheduler, Timestamp, invoke_action};
use crate::disposables::DisposableRef;
use crate::error::RxError;

/// Runs every action synchronously on the calling thread.
///
/// Delays are refused with [`RxError::WouldBlock`]: this scheduler never
/// waits. Action errors are returned from the `schedule*` call.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

static INSTANCE: OnceLock<Arc<ImmediateScheduler>> = OnceLock::new();

impl ImmediateScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Process-wide shared instance.
    #[must_use]
    pub fn singleton() -> Arc<ImmediateScheduler> {
        Arc::clone(INSTANCE.get_or_init(|| Arc::new(ImmediateScheduler)))
    }
}

impl Scheduler for ImmediateScheduler {
    fn schedule(&self, action: ScheduledAction) -> Result<DisposableRef, RxError> {
        invoke_action(self, action)
    }

    fn schedule_relative(
        &self,
        delay: Duration,
        action: ScheduledAction,
    ) -> Result<DisposableRef, RxError> {
        if delay > Duration::ZERO {
            return Err(RxError::WouldBlock { delay });
        }
        invoke_action(self, action)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SchedulerExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_runs_inline() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        ImmediateScheduler::singleton()
            .schedule_fn(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
            .expect("immediate schedule");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_positive_delay_would_block() {
        let err = ImmediateScheduler::new()
            .schedule_relative_fn(Duration::from_millis(1), |_| Ok(None))
            .err();
        assert_eq!(
            err,
            Some(RxError::WouldBlock {
                delay: Duration::from_millis(1)
            })
        );
    }

    #[test]
    fn test_past_absolute_runs_now() {
        let s = ImmediateScheduler::new();
        let past = s.now() - Duration::from_secs(1);
        assert!(s.schedule_absolute_fn(past, |_| Ok(None)).is_ok());

        let future = s.now() + Duration::from_secs(60);
        assert!(matches!(
            s.schedule_absolute_fn(future, |_| Ok(None)),
            Err(RxError::WouldBlock { .. })
        ));
    }

    #[test]
    fn test_action_error_is_returned() {
        let res = ImmediateScheduler::new().schedule_fn(|_| Err(RxError::failure("nope")));
        assert_eq!(res.err(), Some(RxError::failure("nope")));
    }

    #[test]
    fn test_singleton_is_shared() {
        assert!(Arc::ptr_eq(
            &ImmediateScheduler::singleton(),
            &ImmediateScheduler::singleton()
        ));
    }
}
