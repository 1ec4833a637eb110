//! Test actions — recording and failing condition/event implementations.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, ThreadId};
use std::time::Duration;

use questline_core::condition::ComposedCondition;
use questline_core::error::QuestError;
use questline_core::event::ComposedEvent;
use questline_core::profile::Profile;
use uuid::Uuid;

/// Builds a profile with a fresh player id.
#[must_use]
pub fn test_profile(name: &str) -> Profile {
    Profile::new(Uuid::new_v4(), name)
}

/// A single recorded invocation.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Profile the action was invoked with.
    pub profile: Option<Profile>,
    /// Thread the action ran on.
    pub thread_id: ThreadId,
    /// Name of that thread, if it has one.
    pub thread_name: Option<String>,
}

#[derive(Debug, Clone)]
enum Outcome<T> {
    Succeed(T),
    Fail {
        message: String,
        cause: Option<String>,
    },
}

#[derive(Debug)]
struct CallLog {
    calls: Mutex<Vec<RecordedCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Option<Duration>,
}

impl CallLog {
    fn new(delay: Option<Duration>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay,
        }
    }

    fn record<T: Clone>(
        &self,
        profile: Option<&Profile>,
        outcome: &Outcome<T>,
    ) -> Result<T, QuestError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let thread = thread::current();
        self.calls.lock().unwrap().push(RecordedCall {
            profile: profile.cloned(),
            thread_id: thread.id(),
            thread_name: thread.name().map(str::to_owned),
        });
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match outcome {
            Outcome::Succeed(value) => Ok(value.clone()),
            Outcome::Fail {
                message,
                cause: Some(cause),
            } => Err(QuestError::with_cause(message.clone(), cause.clone())),
            Outcome::Fail {
                message,
                cause: None,
            } => Err(QuestError::runtime(message.clone())),
        }
    }

    fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

/// A composed condition that returns a fixed outcome and records every call.
#[derive(Debug)]
pub struct RecordingCondition {
    outcome: Outcome<bool>,
    log: CallLog,
}

impl RecordingCondition {
    /// A condition that always evaluates to `result`.
    #[must_use]
    pub fn returning(result: bool) -> Self {
        Self {
            outcome: Outcome::Succeed(result),
            log: CallLog::new(None),
        }
    }

    /// A condition that always fails with `message` and, if given, a cause
    /// carrying `cause`.
    #[must_use]
    pub fn failing(message: &str, cause: Option<&str>) -> Self {
        Self {
            outcome: Outcome::Fail {
                message: message.to_owned(),
                cause: cause.map(str::to_owned),
            },
            log: CallLog::new(None),
        }
    }

    /// Makes every call sleep for `delay` before returning.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.log.delay = Some(delay);
        self
    }

    /// Returns a snapshot of all recorded calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.log.calls()
    }

    /// Returns the number of recorded calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn call_count(&self) -> usize {
        self.log.calls.lock().unwrap().len()
    }

    /// Returns the profile of the most recent call, `None` if there was no
    /// call or it was static.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn last_profile(&self) -> Option<Profile> {
        self.log
            .calls
            .lock()
            .unwrap()
            .last()
            .and_then(|call| call.profile.clone())
    }

    /// Highest number of calls observed running at the same time.
    pub fn max_concurrent_calls(&self) -> usize {
        self.log.max_in_flight.load(Ordering::SeqCst)
    }
}

impl ComposedCondition for RecordingCondition {
    fn check_for(&self, profile: Option<&Profile>) -> Result<bool, QuestError> {
        self.log.record(profile, &self.outcome)
    }
}

/// A composed event that records every call and optionally fails.
#[derive(Debug)]
pub struct RecordingEvent {
    outcome: Outcome<()>,
    log: CallLog,
}

impl RecordingEvent {
    /// An event that always succeeds.
    #[must_use]
    pub fn succeeding() -> Self {
        Self {
            outcome: Outcome::Succeed(()),
            log: CallLog::new(None),
        }
    }

    /// An event that always fails with `message` and, if given, a cause
    /// carrying `cause`.
    #[must_use]
    pub fn failing(message: &str, cause: Option<&str>) -> Self {
        Self {
            outcome: Outcome::Fail {
                message: message.to_owned(),
                cause: cause.map(str::to_owned),
            },
            log: CallLog::new(None),
        }
    }

    /// Makes every call sleep for `delay` before returning.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.log.delay = Some(delay);
        self
    }

    /// Returns a snapshot of all recorded calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.log.calls()
    }

    /// Returns the number of recorded calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn call_count(&self) -> usize {
        self.log.calls.lock().unwrap().len()
    }

    /// Highest number of calls observed running at the same time.
    pub fn max_concurrent_calls(&self) -> usize {
        self.log.max_in_flight.load(Ordering::SeqCst)
    }
}

impl ComposedEvent for RecordingEvent {
    fn execute_for(&self, profile: Option<&Profile>) -> Result<(), QuestError> {
        self.log.record(profile, &self.outcome)
    }
}
