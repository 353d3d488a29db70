//! # LogObserver: notification printer
//!
//! A minimal observer that writes every notification it receives as a
//! `tracing` event. Use it for demos and debugging.
//!
//! ## Example output
//! ```text
//! [next] observer="ticks" value=1
//! [next] observer="ticks" value=2
//! [error] observer="ticks" label=failure err="sequence failed: boom"
//! [completed] observer="ticks"
//! ```

use std::fmt::Debug;
use std::marker::PhantomData;

use super::Observer;
use crate::error::RxError;

/// Observer logging each notification under a name.
pub struct LogObserver<T> {
    name: String,
    _values: PhantomData<fn(T)>,
}

impl<T> LogObserver<T> {
    /// Construct a new [`LogObserver`] labelled `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            _values: PhantomData,
        }
    }
}

impl<T: Debug> Observer<T> for LogObserver<T> {
    fn on_next(&self, value: T) {
        tracing::info!("[next] observer={:?} value={:?}", self.name, value);
    }

    fn on_error(&self, error: RxError) {
        tracing::warn!(
            "[error] observer={:?} label={} err={:?}",
            self.name,
            error.as_label(),
            error.to_string()
        );
    }

    fn on_completed(&self) {
        tracing::info!("[completed] observer={:?}", self.name);
    }
}
