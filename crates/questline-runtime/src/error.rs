//! Questline runtime — error types.

use thiserror::Error;

/// Errors raised while reading runtime configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be used.
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// The offending variable.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Startup errors for the primary-thread runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The primary thread could not be spawned.
    #[error("failed to spawn primary thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The global tracing subscriber could not be installed.
    #[error("telemetry error: {0}")]
    Telemetry(String),
}
