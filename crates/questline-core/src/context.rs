//! Execution context handle for primary-thread dispatch.
//!
//! The primary-thread wrappers never touch threads or queues directly. The
//! host supplies a [`PrimaryThreadContext`] bundling the three capabilities
//! they need: telling whether the current thread is the primary thread,
//! scheduling work onto it, and the owner under which work is scheduled.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::ScheduleError;

/// A unit of work handed to the primary thread.
pub type UnitOfWork = Box<dyn FnOnce() + Send + 'static>;

/// Identifier a scheduler assigns to accepted work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Tells whether the calling thread is the primary thread.
pub trait ThreadIdentity: Send + Sync {
    /// Returns `true` when called on the primary thread.
    fn is_primary_thread(&self) -> bool;
}

/// Runs units of work on the primary thread.
pub trait PrimaryScheduler: Send + Sync {
    /// Queues `work` for execution on the primary thread under `owner`.
    ///
    /// Work that is accepted runs exactly once, unless the scheduler discards
    /// it first; discarding drops `work` without calling it.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError` if the work cannot be accepted.
    fn schedule(&self, owner: &TaskOwner, work: UnitOfWork) -> Result<TaskId, ScheduleError>;
}

#[derive(Debug)]
struct OwnerState {
    name: String,
    active: AtomicBool,
}

/// Liveness token of whatever owns scheduled work (a plugin, a quest package).
///
/// Clones share state: deactivating one clone deactivates all of them.
#[derive(Debug, Clone)]
pub struct TaskOwner {
    state: Arc<OwnerState>,
}

impl TaskOwner {
    /// Creates an active owner.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            state: Arc::new(OwnerState {
                name: name.into(),
                active: AtomicBool::new(true),
            }),
        }
    }

    /// Returns the owner name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.state.name
    }

    /// Returns `true` while the owner accepts scheduled work.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.active.load(Ordering::Acquire)
    }

    /// Marks the owner inactive. Irreversible.
    pub fn deactivate(&self) {
        self.state.active.store(false, Ordering::Release);
    }
}

/// Host capabilities consumed by the primary-thread wrappers.
#[derive(Clone)]
pub struct PrimaryThreadContext {
    identity: Arc<dyn ThreadIdentity>,
    scheduler: Arc<dyn PrimaryScheduler>,
    owner: TaskOwner,
    timeout: Option<Duration>,
}

impl PrimaryThreadContext {
    /// Bundles the host capabilities. Callers off the primary thread wait
    /// without a bound.
    #[must_use]
    pub fn new(
        identity: Arc<dyn ThreadIdentity>,
        scheduler: Arc<dyn PrimaryScheduler>,
        owner: TaskOwner,
    ) -> Self {
        Self {
            identity,
            scheduler,
            owner,
            timeout: None,
        }
    }

    /// Bounds how long a caller off the primary thread waits for its result.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns `true` when called on the primary thread.
    #[must_use]
    pub fn is_primary_thread(&self) -> bool {
        self.identity.is_primary_thread()
    }

    /// Schedules `work` on the primary thread under this context's owner.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError` if the scheduler rejects the work.
    pub fn run_on_primary(&self, work: UnitOfWork) -> Result<TaskId, ScheduleError> {
        self.scheduler.schedule(&self.owner, work)
    }

    /// Returns the owner work is scheduled under.
    #[must_use]
    pub fn owner(&self) -> &TaskOwner {
        &self.owner
    }

    /// Returns the bounded wait, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Debug for PrimaryThreadContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimaryThreadContext")
            .field("owner", &self.owner.name())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
