//! Test execution contexts — fake `ThreadIdentity`/`PrimaryScheduler` hosts.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use questline_core::context::{
    PrimaryScheduler, PrimaryThreadContext, TaskId, TaskOwner, ThreadIdentity, UnitOfWork,
};
use questline_core::error::ScheduleError;

#[derive(Debug, Clone)]
enum Mode {
    OnPrimary,
    Inline,
    Discard,
    Reject(ScheduleError),
}

/// A host that answers the primary-thread question with a fixed value and
/// records every submission.
///
/// Off the primary thread, accepted work is run synchronously on the
/// submitting thread, dropped unrun, or rejected, depending on the
/// constructor used. Inactive owners are always rejected.
#[derive(Debug)]
pub struct FakeExecutionContext {
    mode: Mode,
    submissions: AtomicU64,
}

impl FakeExecutionContext {
    fn with_mode(mode: Mode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            submissions: AtomicU64::new(0),
        })
    }

    /// Every caller is on the primary thread.
    #[must_use]
    pub fn on_primary_thread() -> Arc<Self> {
        Self::with_mode(Mode::OnPrimary)
    }

    /// No caller is on the primary thread; submitted work runs inline.
    #[must_use]
    pub fn off_primary_thread() -> Arc<Self> {
        Self::with_mode(Mode::Inline)
    }

    /// No caller is on the primary thread; submitted work is accepted and
    /// then dropped without running.
    #[must_use]
    pub fn discarding() -> Arc<Self> {
        Self::with_mode(Mode::Discard)
    }

    /// No caller is on the primary thread; every submission fails with
    /// `error`.
    #[must_use]
    pub fn rejecting(error: ScheduleError) -> Arc<Self> {
        Self::with_mode(Mode::Reject(error))
    }

    /// Number of units of work that reached the scheduler.
    #[must_use]
    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Builds an execution context backed by this fake.
    #[must_use]
    pub fn context(self: &Arc<Self>, owner: TaskOwner) -> PrimaryThreadContext {
        let host: Arc<Self> = Arc::clone(self);
        PrimaryThreadContext::new(host.clone(), host, owner)
    }
}

impl ThreadIdentity for FakeExecutionContext {
    fn is_primary_thread(&self) -> bool {
        matches!(self.mode, Mode::OnPrimary)
    }
}

impl PrimaryScheduler for FakeExecutionContext {
    fn schedule(&self, owner: &TaskOwner, work: UnitOfWork) -> Result<TaskId, ScheduleError> {
        let id = TaskId(self.submissions.fetch_add(1, Ordering::SeqCst) + 1);
        if !owner.is_active() {
            return Err(ScheduleError::OwnerInactive(owner.name().to_owned()));
        }
        match &self.mode {
            Mode::OnPrimary | Mode::Inline => work(),
            Mode::Discard => drop(work),
            Mode::Reject(error) => return Err(error.clone()),
        }
        Ok(id)
    }
}
