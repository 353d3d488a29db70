//! # rxfabric
//!
//! **rxfabric** is the core of a reactive-extensions library: push-based
//! sequences ([`Observable`]) delivered to sinks ([`Observer`]), with time
//! and execution context abstracted behind [`Scheduler`]s and every
//! subscription owned by a [`Disposable`].
//!
//! Operators are out of scope; the crate provides the contracts they build on.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌────────────────┐   subscribe(observer, scheduler?)   ┌──────────────────────┐
//!   │   Observable   │ ──────────────────────────────────► │  AutoDetachObserver  │
//!   │ (subscribe fn) │                                     │  grammar + detach    │
//!   └───────┬────────┘                                     └──────────┬───────────┘
//!           │ schedules work on                                       │ owns
//!           ▼                                                         ▼
//!   ┌────────────────────────────────────────┐            ┌──────────────────────┐
//!   │ Scheduler                              │            │ Disposable graph     │
//!   │ Immediate · CurrentThread · EventLoop  │──returns──►│ Composite · Serial   │
//!   │ NewThread · ThreadPool · Timeout       │            │ SingleAssignment     │
//!   │ Catch · VirtualTime                    │            │ RefCount · Scheduled │
//!   └────────────────────────────────────────┘            └──────────────────────┘
//!
//!   ┌──────────────┐  connect()  ┌──────────────┐  broadcast  ┌─────────────┐
//!   │    source    │ ──────────► │   Subject    │ ──────────► │ subscribers │
//!   └──────────────┘             └──────────────┘             └─────────────┘
//!          ConnectableObservable ─► ref_count() / share()
//! ```
//!
//! ### Subscription lifecycle
//! ```text
//! subscribe ──► AutoDetach wrapper ──► subscribe fn runs (trampolined or scheduled)
//!   │
//!   ├─ on_next*                 delivered while not stopped
//!   ├─ on_error | on_completed  delivered once, then resources disposed
//!   ├─ on_next handler panics   converted to on_error(Panicked)
//!   └─ handle.dispose()         delivery stops, resources disposed
//! ```
//!
//! ## Features
//! | Area | Description | Key types |
//! |------|-------------|-----------|
//! | **Disposables** | Cancellable resource handles that compose | [`Disposable`], [`CompositeDisposable`], [`SerialDisposable`], [`RefCountDisposable`] |
//! | **Schedulers** | Time and execution context | [`Scheduler`], [`EventLoopScheduler`], [`VirtualTimeScheduler`] |
//! | **Observables** | Subscription contract and blocking `run` | [`Observable`], [`ConnectableObservable`] |
//! | **Observers** | Closure observers and grammar enforcement | [`AnonymousObserver`], [`CheckedObserver`] |
//! | **Subjects** | Multicast hubs | [`Subject`], [`BehaviorSubject`], [`ReplaySubject`], [`AsyncSubject`] |
//! | **Errors** | Typed failures | [`RxError`] |
//! | **Configuration** | Worker and clock knobs | [`Config`] |
//!
//! ## Optional features
//! - `logging`: exports [`LogObserver`], which writes notifications to `tracing` _(demo/reference only)_.
//! - `testing` (default): exports the [`testing`] module with `TestScheduler`, `MockObserver` and test observables.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use rxfabric::{Disposable, Observable, Observer, Subject};
//!
//! let subject = Subject::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let s = Arc::clone(&seen);
//! let sub = subject.as_observable().subscribe_fn(move |v: i32| s.lock().push(v));
//!
//! subject.on_next(1);
//! subject.on_next(2);
//! sub.dispose();
//! subject.on_next(3);
//!
//! assert_eq!(*seen.lock(), vec![1, 2]);
//! assert_eq!(Observable::of(vec![1, 2, 3]).run(), Ok(3));
//! ```
mod config;
mod error;
mod internal;
mod notification;
mod observable;
mod observers;
mod subjects;

pub mod disposables;
pub mod scheduler;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// ---- Public re-exports ----

pub use config::Config;
pub use disposables::{
    AnonymousDisposable, BooleanDisposable, CompositeDisposable, Disposable, DisposableRef,
    EmptyDisposable, MultipleAssignmentDisposable, RefCountDisposable, ScheduledDisposable,
    SerialDisposable, SingleAssignmentDisposable,
};
pub use error::RxError;
pub use notification::Notification;
pub use observable::{ConnectableObservable, Observable, SubscribeFn};
pub use observers::{
    AnonymousObserver, AutoDetachObserver, CheckedObserver, Observer, ObserverRef,
    SynchronizedObserver,
};
pub use scheduler::{
    CatchScheduler, ClockUnit, CurrentThreadScheduler, EventLoopScheduler, ImmediateScheduler,
    NewThreadScheduler, Scheduler, SchedulerExt, SchedulerRef, ThreadPoolScheduler,
    TimeoutScheduler, Timestamp, TrampolineScheduler, VirtualTimeScheduler,
};
pub use subjects::{AsyncSubject, BehaviorSubject, ReplaySubject, Subject, SubjectLike};

// Optional: a notification logger (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogObserver;
