//! Primary-thread executor.
//!
//! Owns one dedicated thread that runs submitted units of work one at a time,
//! in submission order. It is the host side of
//! [`PrimaryThreadContext`]: it answers whether the caller is on the primary
//! thread and accepts work for it.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use questline_core::context::{
    PrimaryScheduler, PrimaryThreadContext, TaskId, TaskOwner, ThreadIdentity, UnitOfWork,
};
use questline_core::error::ScheduleError;
use tracing::{debug, error, info, trace, warn};

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;

/// Executor counters snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorStats {
    /// Units of work waiting in the queue.
    pub queue_depth: usize,
    /// Units of work that ran to completion.
    pub tasks_completed: u64,
    /// Units of work dropped because their owner became inactive.
    pub tasks_discarded: u64,
    /// Units of work that panicked.
    pub tasks_panicked: u64,
}

struct Envelope {
    id: TaskId,
    owner: TaskOwner,
    work: UnitOfWork,
}

struct Shared {
    queue: Mutex<VecDeque<Envelope>>,
    work_ready: Condvar,
    shutdown: AtomicBool,
    primary_id: OnceLock<ThreadId>,
    next_id: AtomicU64,
    capacity: usize,
    tasks_completed: AtomicU64,
    tasks_discarded: AtomicU64,
    tasks_panicked: AtomicU64,
}

impl ThreadIdentity for Shared {
    fn is_primary_thread(&self) -> bool {
        self.primary_id.get() == Some(&thread::current().id())
    }
}

impl PrimaryScheduler for Shared {
    fn schedule(&self, owner: &TaskOwner, work: UnitOfWork) -> Result<TaskId, ScheduleError> {
        if !owner.is_active() {
            return Err(ScheduleError::OwnerInactive(owner.name().to_owned()));
        }

        let id = {
            let mut queue = self.queue.lock();
            // Checked under the lock so nothing is queued after the worker
            // has drained and exited.
            if self.shutdown.load(Ordering::Acquire) {
                return Err(ScheduleError::ShutDown);
            }
            if queue.len() >= self.capacity {
                return Err(ScheduleError::QueueFull {
                    capacity: self.capacity,
                });
            }
            let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
            queue.push_back(Envelope {
                id,
                owner: owner.clone(),
                work,
            });
            id
        };

        self.work_ready.notify_one();
        trace!(task_id = %id, owner = owner.name(), "queued unit of work");
        Ok(id)
    }
}

impl Shared {
    fn run(&self, envelope: Envelope) {
        let Envelope { id, owner, work } = envelope;

        // Work whose owner went away while queued is dropped unrun; its
        // caller is woken with an abandoned result.
        if !owner.is_active() {
            self.tasks_discarded.fetch_add(1, Ordering::Relaxed);
            debug!(task_id = %id, owner = owner.name(), "discarding work of inactive owner");
            drop(work);
            return;
        }

        if panic::catch_unwind(AssertUnwindSafe(work)).is_ok() {
            self.tasks_completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.tasks_panicked.fetch_add(1, Ordering::Relaxed);
            error!(task_id = %id, owner = owner.name(), "unit of work panicked");
        }
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let envelope = {
            let mut queue = shared.queue.lock();
            loop {
                if let Some(envelope) = queue.pop_front() {
                    break envelope;
                }
                if shared.shutdown.load(Ordering::Acquire) {
                    return;
                }
                shared.work_ready.wait(&mut queue);
            }
        };
        shared.run(envelope);
    }
}

/// A dedicated primary thread with a FIFO work queue.
pub struct PrimaryThreadExecutor {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    thread_name: String,
    sync_timeout: Option<Duration>,
}

impl PrimaryThreadExecutor {
    /// Spawns the primary thread described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Spawn` if the thread cannot be created.
    pub fn start(config: &RuntimeConfig) -> Result<Self, RuntimeError> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            work_ready: Condvar::new(),
            shutdown: AtomicBool::new(false),
            primary_id: OnceLock::new(),
            next_id: AtomicU64::new(0),
            capacity: config.queue_capacity,
            tasks_completed: AtomicU64::new(0),
            tasks_discarded: AtomicU64::new(0),
            tasks_panicked: AtomicU64::new(0),
        });

        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || worker_loop(&worker_shared))?;
        // Nothing can be scheduled before `start` returns, so the id is set
        // before the first identity check.
        let recorded = shared.primary_id.set(handle.thread().id());
        debug_assert!(recorded.is_ok(), "primary thread id set twice");

        info!(
            thread = %config.thread_name,
            capacity = config.queue_capacity,
            sync_timeout = ?config.sync_timeout,
            "primary thread started"
        );

        Ok(Self {
            shared,
            worker: Mutex::new(Some(handle)),
            thread_name: config.thread_name.clone(),
            sync_timeout: config.sync_timeout,
        })
    }

    /// Reads [`RuntimeConfig`] from the environment and starts the executor.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError` if configuration is invalid or the thread
    /// cannot be created.
    pub fn from_env() -> Result<Self, RuntimeError> {
        Self::start(&RuntimeConfig::from_env()?)
    }

    /// Builds an execution context scheduling onto this executor under
    /// `owner`, with the configured bounded wait.
    #[must_use]
    pub fn context(&self, owner: TaskOwner) -> PrimaryThreadContext {
        let shared: Arc<Shared> = Arc::clone(&self.shared);
        let context = PrimaryThreadContext::new(shared.clone(), shared, owner);
        match self.sync_timeout {
            Some(timeout) => context.with_timeout(timeout),
            None => context,
        }
    }

    /// Returns the name of the primary thread.
    #[must_use]
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    /// Returns `true` when called on this executor's primary thread.
    #[must_use]
    pub fn is_primary_thread(&self) -> bool {
        self.shared.is_primary_thread()
    }

    /// Returns a snapshot of the executor counters.
    #[must_use]
    pub fn stats(&self) -> ExecutorStats {
        ExecutorStats {
            queue_depth: self.shared.queue.lock().len(),
            tasks_completed: self.shared.tasks_completed.load(Ordering::Relaxed),
            tasks_discarded: self.shared.tasks_discarded.load(Ordering::Relaxed),
            tasks_panicked: self.shared.tasks_panicked.load(Ordering::Relaxed),
        }
    }

    /// Stops accepting work, lets the primary thread finish what is queued,
    /// and joins it. Idempotent.
    ///
    /// Called from the primary thread itself, the thread is told to stop but
    /// not joined.
    pub fn shutdown(&self) {
        {
            let _queue = self.shared.queue.lock();
            self.shared.shutdown.store(true, Ordering::Release);
            self.shared.work_ready.notify_all();
        }

        let Some(handle) = self.worker.lock().take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            warn!(thread = %self.thread_name, "shutdown requested on the primary thread");
            return;
        }
        if handle.join().is_err() {
            error!(thread = %self.thread_name, "primary thread terminated abnormally");
        } else {
            info!(thread = %self.thread_name, "primary thread stopped");
        }
    }
}

impl Drop for PrimaryThreadExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for PrimaryThreadExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimaryThreadExecutor")
            .field("thread_name", &self.thread_name)
            .field("sync_timeout", &self.sync_timeout)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
