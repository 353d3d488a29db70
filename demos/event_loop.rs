//! # Event loop with logging
//!
//! Runs a sequence on a dedicated `EventLoopScheduler` thread and logs every
//! notification through `LogObserver`. A `CatchScheduler` in front of the
//! loop absorbs a failing action so later work keeps running.
//!
//! Run with: `cargo run --example event_loop --features logging`

use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use rxfabric::{
    CatchScheduler, Disposable, EventLoopScheduler, LogObserver, Observable, RxError,
    SchedulerExt, SchedulerRef, Subject,
};

fn main() -> Result<(), RxError> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_thread_names(true)
        .init();

    let event_loop = Arc::new(EventLoopScheduler::new());
    let scheduler: SchedulerRef = event_loop.clone();

    let last = Observable::of(vec![1, 2, 3])
        .subscribe_on(Arc::clone(&scheduler))
        .run()?;
    tracing::info!(last, "cold sequence finished on the event loop");

    let subject = Subject::new();
    let _log = subject
        .as_observable()
        .subscribe_with(Arc::new(LogObserver::new("ticks")), Arc::clone(&scheduler));

    let catch = CatchScheduler::new(Arc::clone(&scheduler), |err| {
        tracing::warn!(label = err.as_label(), "handled: {err}");
        true
    });
    catch.schedule_fn(|_| Err(RxError::failure("flaky action")))?;

    let (done_tx, done_rx) = mpsc::channel();
    let ticker = subject.clone();
    catch.schedule_fn(move |_| {
        for n in 0..3 {
            ticker.try_on_next(n)?;
        }
        ticker.try_on_completed()?;
        let _ = done_tx.send(());
        Ok(None)
    })?;

    if done_rx.recv_timeout(Duration::from_secs(5)).is_err() {
        tracing::error!("event loop did not finish in time");
    }
    event_loop.dispose();
    Ok(())
}
