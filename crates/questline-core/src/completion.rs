//! Single-result slot connecting a blocked caller with the primary thread.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

enum Slot<T> {
    Pending,
    Done(T),
    Abandoned,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

/// Why a wait finished without a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitError {
    /// The completer was dropped without producing a value.
    Abandoned,
    /// The deadline passed first.
    TimedOut,
}

/// Sending half, moved into the unit of work.
pub(crate) struct Completer<T> {
    shared: Option<Arc<Shared<T>>>,
}

/// Receiving half, kept by the blocked caller.
pub(crate) struct Completion<T> {
    shared: Arc<Shared<T>>,
}

pub(crate) fn channel<T>() -> (Completer<T>, Completion<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot::Pending),
        ready: Condvar::new(),
    });
    (
        Completer {
            shared: Some(Arc::clone(&shared)),
        },
        Completion { shared },
    )
}

impl<T> Completer<T> {
    pub(crate) fn complete(mut self, value: T) {
        if let Some(shared) = self.shared.take() {
            *shared.slot.lock() = Slot::Done(value);
            shared.ready.notify_one();
        }
    }
}

// A completer dropped without `complete` (discarded work, a panic while
// running it) must still wake the caller.
impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            *shared.slot.lock() = Slot::Abandoned;
            shared.ready.notify_one();
        }
    }
}

impl<T> Completion<T> {
    /// Blocks until the value arrives, the completer is dropped, or
    /// `timeout` elapses. A timeout too large to express as a deadline waits
    /// without one.
    pub(crate) fn wait(self, timeout: Option<Duration>) -> Result<T, WaitError> {
        let deadline = timeout.and_then(|timeout| Instant::now().checked_add(timeout));
        let mut slot = self.shared.slot.lock();
        loop {
            match std::mem::replace(&mut *slot, Slot::Pending) {
                Slot::Done(value) => return Ok(value),
                Slot::Abandoned => return Err(WaitError::Abandoned),
                Slot::Pending => {}
            }
            match deadline {
                Some(deadline) => {
                    if self.shared.ready.wait_until(&mut slot, deadline).timed_out()
                        && matches!(*slot, Slot::Pending)
                    {
                        return Err(WaitError::TimedOut);
                    }
                }
                None => self.shared.ready.wait(&mut slot),
            }
        }
    }
}
