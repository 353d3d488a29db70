//! # Subject fan-out
//!
//! Shows the four subject flavours side by side:
//! - `Subject`: late subscribers only see what comes after they join
//! - `BehaviorSubject`: a subscriber first receives the current value
//! - `ReplaySubject`: a subscriber first receives the buffered history
//! - `AsyncSubject`: only the last value, and only on completion
//!
//! Run with: `cargo run --example subject_fanout`

use rxfabric::{
    AnonymousObserver, AsyncSubject, BehaviorSubject, Disposable, Observable, Observer,
    ReplaySubject, Subject,
};

fn printer(name: &'static str) -> AnonymousObserver<i32> {
    AnonymousObserver::new(move |v| println!("  {name}: next {v}"))
        .with_error(move |e| println!("  {name}: error {e}"))
        .with_completed(move || println!("  {name}: completed"))
}

fn main() {
    println!("Subject");
    let subject = Subject::new();
    let early = subject.as_observable().subscribe(printer("early"));
    subject.on_next(1);
    let late = subject.as_observable().subscribe(printer("late"));
    subject.on_next(2);
    early.dispose();
    subject.on_next(3);
    subject.on_completed();
    late.dispose();

    println!("BehaviorSubject");
    let behavior = BehaviorSubject::new(0);
    behavior.on_next(10);
    let _sub = behavior.as_observable().subscribe(printer("joined"));
    behavior.on_next(11);
    if let Ok(current) = behavior.value() {
        println!("  current value: {current}");
    }

    println!("ReplaySubject (buffer 2)");
    let replay = ReplaySubject::with_buffer(2);
    for v in 1..=4 {
        replay.on_next(v);
    }
    let _sub = replay.as_observable().subscribe(printer("replayed"));

    println!("AsyncSubject");
    let last = AsyncSubject::new();
    let _sub = last.as_observable().subscribe(printer("waiting"));
    last.on_next(7);
    last.on_next(8);
    last.on_completed();
    let _sub = last.as_observable().subscribe(printer("after"));

    println!("Shared cold source");
    let shared = Observable::of(vec![100, 200]).publish();
    let _a = shared.subscribe(printer("a"));
    let _b = shared.subscribe(printer("b"));
    let connection = shared.connect();
    connection.dispose();
}
