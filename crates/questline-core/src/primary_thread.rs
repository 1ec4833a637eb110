//! Wrappers that run quest actions on the primary thread.
//!
//! Calls made on the primary thread run in place. Calls from any other thread
//! are scheduled onto it through the [`PrimaryThreadContext`], and the caller
//! blocks until the action has produced its value or error. Either way the
//! caller observes exactly what the wrapped action returned. A panic inside
//! the action is resumed on the caller, as it would be in place.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::completion::{self, WaitError};
use crate::condition::{ComposedCondition, Condition, StaticCondition};
use crate::context::PrimaryThreadContext;
use crate::error::{QuestError, ScheduleError};
use crate::event::{ComposedEvent, Event, StaticEvent};
use crate::profile::Profile;

/// Dispatcher shared by all primary-thread wrappers.
pub struct PrimaryThreadType<S: ?Sized> {
    synced: Arc<S>,
    context: PrimaryThreadContext,
}

impl<S: ?Sized + Send + Sync + 'static> PrimaryThreadType<S> {
    /// Wraps `synced` for execution on the primary thread described by
    /// `context`.
    #[must_use]
    pub fn new(synced: Arc<S>, context: PrimaryThreadContext) -> Self {
        Self { synced, context }
    }

    /// Returns the wrapped action.
    #[must_use]
    pub fn synced(&self) -> &Arc<S> {
        &self.synced
    }

    /// Returns the execution context.
    #[must_use]
    pub fn context(&self) -> &PrimaryThreadContext {
        &self.context
    }

    /// Runs `action` against the wrapped value on the primary thread and
    /// returns its result.
    ///
    /// # Errors
    ///
    /// Returns whatever `action` returned, unchanged, or
    /// `QuestError::PrimaryThreadUnavailable` if the action could not be
    /// scheduled or was discarded before running, or
    /// `QuestError::PrimaryThreadTimeout` if the context's bounded wait
    /// elapsed first.
    ///
    /// # Panics
    ///
    /// Resumes the panic of `action` on the calling thread if it panicked on
    /// the primary thread.
    pub fn call<T, F>(&self, action: F) -> Result<T, QuestError>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, QuestError> + Send + 'static,
    {
        if self.context.is_primary_thread() {
            return action(self.synced.as_ref());
        }

        let owner = self.context.owner();
        if !owner.is_active() {
            warn!(owner = owner.name(), "refusing to schedule for inactive owner");
            return Err(ScheduleError::OwnerInactive(owner.name().to_owned()).into());
        }

        let (completer, completion) = completion::channel();
        let synced = Arc::clone(&self.synced);
        let task_id = self
            .context
            .run_on_primary(Box::new(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| action(synced.as_ref())));
                completer.complete(outcome);
            }))
            .map_err(|err| {
                warn!(owner = owner.name(), error = %err, "primary thread rejected work");
                QuestError::from(err)
            })?;
        debug!(task_id = %task_id, owner = owner.name(), "waiting on primary thread");

        let timeout = self.context.timeout();
        match completion.wait(timeout) {
            Ok(Ok(result)) => result,
            Ok(Err(payload)) => {
                error!(task_id = %task_id, "action panicked on the primary thread");
                panic::resume_unwind(payload)
            }
            Err(WaitError::Abandoned) => {
                warn!(task_id = %task_id, "work was discarded before completing");
                Err(QuestError::PrimaryThreadUnavailable(format!(
                    "{task_id} was discarded before completing"
                )))
            }
            Err(WaitError::TimedOut) => {
                warn!(task_id = %task_id, ?timeout, "gave up waiting on primary thread");
                Err(QuestError::PrimaryThreadTimeout(timeout.unwrap_or_default()))
            }
        }
    }
}

impl<S: ?Sized> Clone for PrimaryThreadType<S> {
    fn clone(&self) -> Self {
        Self {
            synced: Arc::clone(&self.synced),
            context: self.context.clone(),
        }
    }
}

impl<S: ?Sized> fmt::Debug for PrimaryThreadType<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimaryThreadType")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Generates a wrapper newtype around [`PrimaryThreadType`].
macro_rules! primary_thread_wrapper {
    ($(#[$doc:meta])* $name:ident, $bound:ident) => {
        $(#[$doc])*
        pub struct $name<S: ?Sized> {
            inner: PrimaryThreadType<S>,
        }

        impl<S: ?Sized> Clone for $name<S> {
            fn clone(&self) -> Self {
                Self {
                    inner: self.inner.clone(),
                }
            }
        }

        impl<S: ?Sized> fmt::Debug for $name<S> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("context", &self.inner.context)
                    .finish_non_exhaustive()
            }
        }

        impl<S: $bound + ?Sized + 'static> $name<S> {
            /// Wraps `synced` for execution on the primary thread described
            /// by `context`.
            #[must_use]
            pub fn new(synced: Arc<S>, context: PrimaryThreadContext) -> Self {
                Self {
                    inner: PrimaryThreadType::new(synced, context),
                }
            }

            /// Returns the underlying dispatcher.
            #[must_use]
            pub fn dispatcher(&self) -> &PrimaryThreadType<S> {
                &self.inner
            }
        }
    };
}

primary_thread_wrapper!(
    /// Runs a [`ComposedCondition`] on the primary thread, for both its
    /// bound and static forms.
    PrimaryThreadComposedCondition,
    ComposedCondition
);

primary_thread_wrapper!(
    /// Runs a [`ComposedEvent`] on the primary thread, for both its bound
    /// and static forms.
    PrimaryThreadComposedEvent,
    ComposedEvent
);

primary_thread_wrapper!(
    /// Runs a [`Condition`] on the primary thread.
    PrimaryThreadCondition,
    Condition
);

primary_thread_wrapper!(
    /// Runs a [`StaticCondition`] on the primary thread.
    PrimaryThreadStaticCondition,
    StaticCondition
);

primary_thread_wrapper!(
    /// Runs an [`Event`] on the primary thread.
    PrimaryThreadEvent,
    Event
);

primary_thread_wrapper!(
    /// Runs a [`StaticEvent`] on the primary thread.
    PrimaryThreadStaticEvent,
    StaticEvent
);

impl<C: ComposedCondition + ?Sized + 'static> ComposedCondition
    for PrimaryThreadComposedCondition<C>
{
    fn check_for(&self, profile: Option<&Profile>) -> Result<bool, QuestError> {
        let profile = profile.cloned();
        self.inner.call(move |synced| synced.check_for(profile.as_ref()))
    }
}

impl<E: ComposedEvent + ?Sized + 'static> ComposedEvent for PrimaryThreadComposedEvent<E> {
    fn execute_for(&self, profile: Option<&Profile>) -> Result<(), QuestError> {
        let profile = profile.cloned();
        self.inner.call(move |synced| synced.execute_for(profile.as_ref()))
    }
}

impl<C: Condition + ?Sized + 'static> Condition for PrimaryThreadCondition<C> {
    fn check(&self, profile: &Profile) -> Result<bool, QuestError> {
        let profile = profile.clone();
        self.inner.call(move |synced| synced.check(&profile))
    }
}

impl<C: StaticCondition + ?Sized + 'static> StaticCondition for PrimaryThreadStaticCondition<C> {
    fn check_static(&self) -> Result<bool, QuestError> {
        self.inner.call(StaticCondition::check_static)
    }
}

impl<E: Event + ?Sized + 'static> Event for PrimaryThreadEvent<E> {
    fn execute(&self, profile: &Profile) -> Result<(), QuestError> {
        let profile = profile.clone();
        self.inner.call(move |synced| synced.execute(&profile))
    }
}

impl<E: StaticEvent + ?Sized + 'static> StaticEvent for PrimaryThreadStaticEvent<E> {
    fn execute_static(&self) -> Result<(), QuestError> {
        self.inner.call(StaticEvent::execute_static)
    }
}
