//! # Testing helpers
//!
//! Deterministic tooling for reactive code, built on virtual time. Time is
//! expressed in float ticks (one tick = one virtual second).
//!
//! - [`TestScheduler`] creates, subscribes and disposes a sequence at fixed
//!   virtual times and runs the clock.
//! - [`MockObserver`] records every notification with its arrival time.
//! - [`HotObservable`] emits at absolute times; [`ColdObservable`] emits at
//!   offsets from each subscription. Both log their subscriptions.
//!
//! ## Example
//! ```
//! use rxfabric::testing::{TestScheduler, on_next, on_completed, subscribed};
//!
//! let scheduler = TestScheduler::new();
//! let source = scheduler.create_hot_observable(vec![
//!     on_next(150.0, 1),
//!     on_next(210.0, 2),
//!     on_completed(300.0),
//! ]);
//! let observable = source.as_observable();
//! let results = scheduler.start_with(move || observable).unwrap();
//!
//! assert_eq!(results.messages(), vec![on_next(210.0, 2), on_completed(300.0)]);
//! assert_eq!(source.subscriptions(), vec![subscribed(200.0, 300.0)]);
//! ```

mod cold;
mod hot;
mod mock_observer;
mod recorded;
mod test_scheduler;

pub use cold::ColdObservable;
pub use hot::HotObservable;
pub use mock_observer::MockObserver;
pub use recorded::{Recorded, Subscription, on_completed, on_error, on_next, subscribed};
pub use test_scheduler::TestScheduler;

/// Default virtual time at which `start_with` creates the observable.
pub const CREATED: f64 = 100.0;
/// Default virtual time at which `start_with` subscribes.
pub const SUBSCRIBED: f64 = 200.0;
/// Default virtual time at which `start_with` disposes the subscription.
pub const DISPOSED: f64 = 1000.0;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RxError;
    use crate::observable::Observable;
    use crate::scheduler::Scheduler;

    #[test]
    fn test_hot_observable_drops_messages_before_subscribe() {
        let scheduler = TestScheduler::new();
        let hot = scheduler.create_hot_observable(vec![
            on_next(110.0, 'a'),
            on_next(220.0, 'b'),
            on_next(1100.0, 'c'),
        ]);
        let source = hot.as_observable();
        let results = scheduler.start_with(move || source).expect("run");

        assert_eq!(results.messages(), vec![on_next(220.0, 'b')]);
        assert_eq!(hot.subscriptions(), vec![subscribed(200.0, 1000.0)]);
    }

    #[test]
    fn test_cold_observable_is_relative_to_subscription() {
        let scheduler = TestScheduler::new();
        let cold = scheduler.create_cold_observable(vec![
            on_next(10.0, 1),
            on_next(20.0, 2),
            on_error(30.0, RxError::failure("boom")),
        ]);
        let source = cold.as_observable();
        let results = scheduler.start_with(move || source).expect("run");

        assert_eq!(
            results.messages(),
            vec![
                on_next(210.0, 1),
                on_next(220.0, 2),
                on_error(230.0, RxError::failure("boom"))
            ]
        );
        assert_eq!(cold.subscriptions(), vec![subscribed(200.0, 230.0)]);
    }

    #[test]
    fn test_dispose_time_cuts_recording() {
        let scheduler = TestScheduler::new();
        let cold = scheduler.create_cold_observable(vec![on_next(100.0, 1), on_next(900.0, 2)]);
        let source = cold.as_observable();
        let results = scheduler
            .start_with_times(move || source, CREATED, SUBSCRIBED, 500.0)
            .expect("run");

        assert_eq!(results.messages(), vec![on_next(300.0, 1)]);
        assert_eq!(cold.subscriptions(), vec![subscribed(200.0, 500.0)]);
    }

    #[test]
    fn test_of_on_test_scheduler_emits_at_subscribe_time() {
        let scheduler = TestScheduler::new();
        let results = scheduler
            .start_with(|| Observable::of(vec![1, 2]))
            .expect("run");
        assert_eq!(
            results.messages(),
            vec![on_next(200.0, 1), on_next(200.0, 2), on_completed(200.0)]
        );
    }

    #[test]
    fn test_advance_by_ticks() {
        let scheduler = TestScheduler::new();
        scheduler.advance_by(12.5).expect("advance");
        assert_eq!(scheduler.ticks(), 12.5);
        assert_eq!(scheduler.now().as_secs_f64(), 12.5);
        assert!(scheduler.advance_to(3.0).is_err());
    }
}
