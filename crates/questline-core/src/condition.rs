//! Condition contracts.
//!
//! A condition is a predicate over the game state. It may be evaluated for a
//! player ([`Condition`]), without any player ([`StaticCondition`]), or both
//! ([`ComposedCondition`]). Conditions are expected not to mutate observable
//! game state.

use crate::error::QuestError;
use crate::profile::Profile;

/// A predicate evaluated for a specific player.
pub trait Condition: Send + Sync {
    /// Checks the condition for `profile`.
    ///
    /// # Errors
    ///
    /// Returns `QuestError` if the condition cannot be evaluated.
    fn check(&self, profile: &Profile) -> Result<bool, QuestError>;
}

/// A predicate evaluated without player context.
pub trait StaticCondition: Send + Sync {
    /// Checks the condition without a profile.
    ///
    /// # Errors
    ///
    /// Returns `QuestError` if the condition cannot be evaluated.
    fn check_static(&self) -> Result<bool, QuestError>;
}

/// A condition that can be evaluated both for a player and statically.
///
/// Implementors provide only [`check_for`](Self::check_for). [`Condition`] and
/// [`StaticCondition`] are derived from it, the static form always being
/// `check_for(None)`.
pub trait ComposedCondition: Send + Sync {
    /// Checks the condition for `profile`, or statically when it is `None`.
    ///
    /// # Errors
    ///
    /// Returns `QuestError` if the condition cannot be evaluated.
    fn check_for(&self, profile: Option<&Profile>) -> Result<bool, QuestError>;
}

impl<T: ComposedCondition + ?Sized> Condition for T {
    fn check(&self, profile: &Profile) -> Result<bool, QuestError> {
        self.check_for(Some(profile))
    }
}

impl<T: ComposedCondition + ?Sized> StaticCondition for T {
    fn check_static(&self) -> Result<bool, QuestError> {
        self.check_for(None)
    }
}

/// A [`ComposedCondition`] backed by a closure.
#[derive(Debug, Clone, Copy)]
pub struct FnCondition<F>(F);

/// Builds a composed condition from a closure over an optional profile.
pub fn condition_fn<F>(check: F) -> FnCondition<F>
where
    F: Fn(Option<&Profile>) -> Result<bool, QuestError> + Send + Sync,
{
    FnCondition(check)
}

impl<F> ComposedCondition for FnCondition<F>
where
    F: Fn(Option<&Profile>) -> Result<bool, QuestError> + Send + Sync,
{
    fn check_for(&self, profile: Option<&Profile>) -> Result<bool, QuestError> {
        (self.0)(profile)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use uuid::Uuid;

    use super::*;

    fn profile() -> Profile {
        Profile::new(Uuid::new_v4(), "Aldric")
    }

    #[test]
    fn test_static_check_matches_check_for_none() {
        let condition = condition_fn(|profile| Ok(profile.is_none()));

        assert_eq!(
            condition.check_static().unwrap(),
            condition.check_for(None).unwrap()
        );
        assert!(condition.check_static().unwrap());
    }

    #[test]
    fn test_bound_check_forwards_profile() {
        let expected = profile();
        let player_id = expected.player_id();
        let condition =
            condition_fn(move |profile| Ok(profile.map(Profile::player_id) == Some(player_id)));

        assert!(condition.check(&expected).unwrap());
        assert!(!condition.check(&profile()).unwrap());
    }

    #[test]
    fn test_static_check_propagates_error_unchanged() {
        let condition = condition_fn(|_| Err(QuestError::runtime("missing variable")));

        let err = condition.check_static().unwrap_err();

        assert_eq!(err.to_string(), "missing variable");
    }

    #[test]
    fn test_repeated_static_checks_are_stable() {
        let calls = AtomicUsize::new(0);
        let condition = condition_fn(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        });

        let results: Vec<bool> = (0..5).map(|_| condition.check_static().unwrap()).collect();

        assert_eq!(results, vec![true; 5]);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_composed_condition_usable_as_trait_objects() {
        let condition = condition_fn(|profile| Ok(profile.is_some()));
        let bound: &dyn Condition = &condition;
        let unbound: &dyn StaticCondition = &condition;

        assert!(bound.check(&profile()).unwrap());
        assert!(!unbound.check_static().unwrap());
    }
}
