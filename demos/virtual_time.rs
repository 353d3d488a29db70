//! # Virtual time
//!
//! Drives timed work without waiting for real time to pass:
//! - absolute and relative schedules on a `VirtualTimeScheduler`
//! - a periodic action cancelled part way through
//! - a `TestScheduler` run that records notifications with their ticks
//!
//! Run with: `cargo run --example virtual_time`

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use rxfabric::testing::{TestScheduler, on_completed, on_next};
use rxfabric::{Disposable, RxError, Scheduler, SchedulerExt, Timestamp, VirtualTimeScheduler};

fn main() -> Result<(), RxError> {
    let vts = VirtualTimeScheduler::new();

    for (secs, label) in [(10, "a"), (5, "b"), (10, "c")] {
        vts.schedule_absolute_fn(Timestamp::from_duration(Duration::from_secs(secs)), move |s| {
            println!("t={:>4.1}s  run {label}", s.now().as_secs_f64());
            Ok(None)
        })?;
    }

    let beats = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&beats);
    let heartbeat = vts.schedule_periodic_fn(Duration::from_secs(3), move || {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        println!("heartbeat #{n}");
        Ok(())
    })?;

    vts.advance_to(Timestamp::from_duration(Duration::from_secs(10)))?;
    heartbeat.dispose();
    vts.start()?;
    println!(
        "clock at {:.1}s after {} heartbeats",
        vts.ticks(),
        beats.load(Ordering::SeqCst)
    );

    let scheduler = TestScheduler::new();
    let cold = scheduler.create_cold_observable(vec![
        on_next(50.0, "x"),
        on_next(150.0, "y"),
        on_completed(400.0),
    ]);
    let source = cold.as_observable();
    let results = scheduler.start_with(move || source)?;
    for message in results.messages() {
        println!("@{:>6.1}  {}", message.time, message.value);
    }
    for subscription in cold.subscriptions() {
        println!(
            "subscribed {} .. {}",
            subscription.subscribe, subscription.unsubscribe
        );
    }
    Ok(())
}
