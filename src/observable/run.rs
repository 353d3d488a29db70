use std::sync::Arc;

use parking_lot::Mutex;

use super::Observable;
use crate::disposables::Disposable;
use crate::error::RxError;
use crate::internal::Signal;
use crate::observers::AnonymousObserver;

impl<T: Send + 'static> Observable<T> {
    /// Subscribes and blocks the calling thread until the sequence terminates.
    ///
    /// Returns the last value, [`RxError::SequenceContainsNoElements`] when
    /// the sequence completed empty, or the error it failed with.
    ///
    /// The latch is released by the producer, so the sequence must make
    /// progress without the calling thread: a source driven by a virtual
    /// clock that only this thread advances never returns.
    ///
    /// # Example
    /// ```
    /// use rxfabric::Observable;
    ///
    /// assert_eq!(Observable::of(vec![1, 2, 3]).run(), Ok(3));
    /// ```
    pub fn run(&self) -> Result<T, RxError> {
        let latch = Arc::new(Signal::new());
        let last = Arc::new(Mutex::new(None));
        let failure = Arc::new(Mutex::new(None));

        let observer = {
            let (last, failure) = (Arc::clone(&last), Arc::clone(&failure));
            let (on_error, on_completed) = (Arc::clone(&latch), Arc::clone(&latch));
            AnonymousObserver::new(move |value| *last.lock() = Some(value))
                .with_error(move |err| {
                    *failure.lock() = Some(err);
                    on_error.set();
                })
                .with_completed(move || on_completed.set())
        };
        let subscription = self.subscribe(observer);
        latch.wait();
        subscription.dispose();

        if let Some(err) = failure.lock().take() {
            return Err(err);
        }
        last.lock().take().ok_or(RxError::SequenceContainsNoElements)
    }
}
