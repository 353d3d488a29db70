//! Error types surfaced by the reactive core.
//!
//! A single enum, [`RxError`], covers every failure the library can report:
//!
//! - contract violations detected at runtime (`ReEntrancy`, `Completed`, `AlreadyAssigned`);
//! - operations on torn-down resources (`Disposed`);
//! - scheduling refusals (`WouldBlock`, `ThreadSpawn`);
//! - failures travelling along a sequence as `OnError` (`Failure`, `Panicked`,
//!   `SequenceContainsNoElements`, `ArgumentOutOfRange`).
//!
//! The type is `Clone` so a subject can broadcast one error to many observers,
//! and `PartialEq` so recorded notifications can be compared in tests.
//! Helper methods (`as_label`, `as_message`) serve logging.

use std::any::Any;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the reactive core.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RxError {
    /// A terminal-value query (`run`, last, single) was made on an empty sequence.
    #[error("sequence contains no elements")]
    SequenceContainsNoElements,

    /// An argument was outside its admissible range (reversed time range, negative count).
    #[error("argument out of range: {detail}")]
    ArgumentOutOfRange {
        /// What was out of range and why.
        detail: String,
    },

    /// The target resource has already been disposed.
    #[error("object has been disposed")]
    Disposed,

    /// A non-reentrant observer was entered while it was already delivering.
    #[error("re-entrant call on a non-reentrant observer")]
    ReEntrancy,

    /// An observer received a notification after its terminal notification.
    #[error("observer has already terminated")]
    Completed,

    /// A delayed schedule was requested on a scheduler that refuses to block.
    #[error("scheduler would block for {delay:?}")]
    WouldBlock {
        /// The delay the caller asked for.
        delay: Duration,
    },

    /// A single-assignment disposable received a second inner value.
    #[error("disposable has already been assigned")]
    AlreadyAssigned,

    /// A producer or user callback failed.
    #[error("sequence failed: {error}")]
    Failure {
        /// The underlying error message.
        error: String,
    },

    /// A user callback panicked; the panic was captured and converted.
    #[error("callback panicked: {message}")]
    Panicked {
        /// The panic payload rendered as text.
        message: String,
    },

    /// A worker thread could not be started.
    #[error("failed to spawn worker: {error}")]
    ThreadSpawn {
        /// The underlying OS or runtime error.
        error: String,
    },
}

impl RxError {
    /// Builds a [`RxError::Failure`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use rxfabric::RxError;
    ///
    /// let err = RxError::failure("boom");
    /// assert_eq!(err.as_message(), "failure: boom");
    /// ```
    pub fn failure(error: impl std::fmt::Display) -> Self {
        RxError::Failure {
            error: error.to_string(),
        }
    }

    /// Converts a captured panic payload into [`RxError::Panicked`].
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        RxError::Panicked {
            message: crate::internal::panic_message(payload),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use rxfabric::RxError;
    /// use std::time::Duration;
    ///
    /// let err = RxError::WouldBlock { delay: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "would_block");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RxError::SequenceContainsNoElements => "sequence_contains_no_elements",
            RxError::ArgumentOutOfRange { .. } => "argument_out_of_range",
            RxError::Disposed => "disposed",
            RxError::ReEntrancy => "re_entrancy",
            RxError::Completed => "completed",
            RxError::WouldBlock { .. } => "would_block",
            RxError::AlreadyAssigned => "already_assigned",
            RxError::Failure { .. } => "failure",
            RxError::Panicked { .. } => "panicked",
            RxError::ThreadSpawn { .. } => "thread_spawn",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RxError::SequenceContainsNoElements => "sequence is empty".to_string(),
            RxError::ArgumentOutOfRange { detail } => format!("out of range: {detail}"),
            RxError::Disposed => "disposed".to_string(),
            RxError::ReEntrancy => "re-entrant delivery".to_string(),
            RxError::Completed => "already terminated".to_string(),
            RxError::WouldBlock { delay } => format!("would block for {delay:?}"),
            RxError::AlreadyAssigned => "already assigned".to_string(),
            RxError::Failure { error } => format!("failure: {error}"),
            RxError::Panicked { message } => format!("panic: {message}"),
            RxError::ThreadSpawn { error } => format!("spawn failed: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(RxError::Disposed.as_label(), "disposed");
        assert_eq!(RxError::ReEntrancy.as_label(), "re_entrancy");
        assert_eq!(RxError::Completed.as_label(), "completed");
        assert_eq!(
            RxError::SequenceContainsNoElements.as_label(),
            "sequence_contains_no_elements"
        );
        assert_eq!(
            RxError::ArgumentOutOfRange {
                detail: "x".into()
            }
            .as_label(),
            "argument_out_of_range"
        );
    }

    #[test]
    fn test_panic_payload_is_rendered() {
        let payload: Box<dyn Any + Send> = Box::new("kaboom");
        let err = RxError::from_panic(payload.as_ref());
        assert_eq!(
            err,
            RxError::Panicked {
                message: "kaboom".into()
            }
        );

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(RxError::from_panic(payload.as_ref()).as_message(), "panic: owned");
    }

    #[test]
    fn test_display_includes_detail() {
        let err = RxError::failure("disk full");
        assert_eq!(err.to_string(), "sequence failed: disk full");
    }
}
