//! Event contracts.
//!
//! Events are the side-effecting half of quest actions: giving items,
//! teleporting, changing world state. Because they mutate shared state they
//! are the main reason for primary-thread dispatch.

use crate::error::QuestError;
use crate::profile::Profile;

/// An effect executed for a specific player.
pub trait Event: Send + Sync {
    /// Executes the event for `profile`.
    ///
    /// # Errors
    ///
    /// Returns `QuestError` if the event cannot be executed.
    fn execute(&self, profile: &Profile) -> Result<(), QuestError>;
}

/// An effect executed without player context.
pub trait StaticEvent: Send + Sync {
    /// Executes the event without a profile.
    ///
    /// # Errors
    ///
    /// Returns `QuestError` if the event cannot be executed.
    fn execute_static(&self) -> Result<(), QuestError>;
}

/// An event that can be executed both for a player and statically.
///
/// Implementors provide only [`execute_for`](Self::execute_for); the static
/// form is always `execute_for(None)`.
pub trait ComposedEvent: Send + Sync {
    /// Executes the event for `profile`, or statically when it is `None`.
    ///
    /// # Errors
    ///
    /// Returns `QuestError` if the event cannot be executed.
    fn execute_for(&self, profile: Option<&Profile>) -> Result<(), QuestError>;
}

impl<T: ComposedEvent + ?Sized> Event for T {
    fn execute(&self, profile: &Profile) -> Result<(), QuestError> {
        self.execute_for(Some(profile))
    }
}

impl<T: ComposedEvent + ?Sized> StaticEvent for T {
    fn execute_static(&self) -> Result<(), QuestError> {
        self.execute_for(None)
    }
}

/// A [`ComposedEvent`] backed by a closure.
#[derive(Debug, Clone, Copy)]
pub struct FnEvent<F>(F);

/// Builds a composed event from a closure over an optional profile.
pub fn event_fn<F>(execute: F) -> FnEvent<F>
where
    F: Fn(Option<&Profile>) -> Result<(), QuestError> + Send + Sync,
{
    FnEvent(execute)
}

impl<F> ComposedEvent for FnEvent<F>
where
    F: Fn(Option<&Profile>) -> Result<(), QuestError> + Send + Sync,
{
    fn execute_for(&self, profile: Option<&Profile>) -> Result<(), QuestError> {
        (self.0)(profile)
    }
}
