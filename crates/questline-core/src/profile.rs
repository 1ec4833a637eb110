//! Player profile identity.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identity of a player-like actor that quest actions run for.
///
/// Profiles are produced by the identity-resolution layer and only read here.
/// Two profiles are equal when they refer to the same player, regardless of
/// the display name they were resolved with.
///
/// Static (context-free) evaluation is expressed as `Option<&Profile>::None`
/// at every call site rather than as a sentinel profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    player_id: Uuid,
    name: String,
}

impl Profile {
    /// Creates a profile for the given player.
    #[must_use]
    pub fn new(player_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            player_id,
            name: name.into(),
        }
    }

    /// Returns the identifier of the underlying player.
    #[must_use]
    pub fn player_id(&self) -> Uuid {
        self.player_id
    }

    /// Returns the display name the profile was resolved with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.player_id == other.player_id
    }
}

impl Eq for Profile {}

impl Hash for Profile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.player_id.hash(state);
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.player_id)
    }
}
