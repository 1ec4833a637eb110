//! Domain error types.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

/// Boxed cause attached to a quest runtime failure.
pub type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// Errors raised by conditions, events and their primary-thread wrappers.
#[derive(Debug, Error)]
pub enum QuestError {
    /// The action itself could not complete (malformed data, illegal state).
    #[error("{message}")]
    Runtime {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<BoxedCause>,
    },

    /// The action never ran because the primary thread could not accept it.
    #[error("primary thread unavailable: {0}")]
    PrimaryThreadUnavailable(String),

    /// The caller gave up waiting for the primary thread.
    #[error("timed out after {0:?} waiting for the primary thread")]
    PrimaryThreadTimeout(Duration),
}

impl QuestError {
    /// Creates a runtime failure without a cause.
    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a runtime failure wrapping `cause`.
    #[must_use]
    pub fn with_cause(message: impl Into<String>, cause: impl Into<BoxedCause>) -> Self {
        Self::Runtime {
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    /// Returns `true` if the failure came from dispatch rather than from the
    /// action itself.
    ///
    /// `PrimaryThreadUnavailable` means the action never ran. After a
    /// `PrimaryThreadTimeout` the queued action may still run later.
    #[must_use]
    pub fn is_primary_thread_failure(&self) -> bool {
        matches!(
            self,
            Self::PrimaryThreadUnavailable(_) | Self::PrimaryThreadTimeout(_)
        )
    }
}

/// Rejection reported by a primary-thread scheduler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The owner the work would run under is no longer active.
    #[error("owner '{0}' is no longer active")]
    OwnerInactive(String),

    /// The scheduler is not accepting work anymore.
    #[error("scheduler has shut down")]
    ShutDown,

    /// The queue of pending work is at capacity.
    #[error("primary thread queue is full ({capacity} pending)")]
    QueueFull {
        /// Configured queue capacity.
        capacity: usize,
    },
}

impl From<ScheduleError> for QuestError {
    fn from(err: ScheduleError) -> Self {
        Self::PrimaryThreadUnavailable(err.to_string())
    }
}
