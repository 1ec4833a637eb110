//! Runtime configuration read from the environment.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Name of the primary thread.
pub const THREAD_NAME_VAR: &str = "QUESTLINE_PRIMARY_THREAD_NAME";
/// Maximum number of pending units of work.
pub const QUEUE_CAPACITY_VAR: &str = "QUESTLINE_QUEUE_CAPACITY";
/// Bounded wait for callers off the primary thread, in milliseconds.
pub const SYNC_TIMEOUT_VAR: &str = "QUESTLINE_SYNC_TIMEOUT_MS";

const DEFAULT_THREAD_NAME: &str = "questline-primary";
const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Settings for the primary-thread executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Name given to the primary thread.
    pub thread_name: String,
    /// Maximum number of queued units of work.
    pub queue_capacity: usize,
    /// How long callers wait for the primary thread; `None` waits forever.
    pub sync_timeout: Option<Duration>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            sync_timeout: None,
        }
    }
}

impl RuntimeConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults for
    /// unset keys.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a key maps to an unusable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let thread_name = lookup(THREAD_NAME_VAR)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_THREAD_NAME.to_owned());

        let queue_capacity = match lookup(QUEUE_CAPACITY_VAR) {
            Some(raw) => parse_positive(QUEUE_CAPACITY_VAR, &raw)?,
            None => DEFAULT_QUEUE_CAPACITY,
        };

        let sync_timeout = lookup(SYNC_TIMEOUT_VAR)
            .map(|raw| parse_positive::<u64>(SYNC_TIMEOUT_VAR, &raw))
            .transpose()?
            .map(Duration::from_millis);

        Ok(Self {
            thread_name,
            queue_capacity,
            sync_timeout,
        })
    }
}

fn parse_positive<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
    T::Err: fmt::Display,
{
    let value: T = raw.trim().parse().map_err(|e| ConfigError::Invalid {
        key,
        reason: format!("'{raw}' is not a valid number: {e}"),
    })?;
    if value == T::default() {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_owned(),
        });
    }
    Ok(value)
}
