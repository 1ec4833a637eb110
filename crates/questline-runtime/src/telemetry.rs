//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::error::RuntimeError;

/// Installs the global JSON tracing subscriber. The filter comes from
/// `RUST_LOG`, defaulting to `info`.
///
/// # Errors
///
/// Returns `RuntimeError::Telemetry` if a global subscriber is already set.
pub fn init_tracing() -> Result<(), RuntimeError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .try_init()
        .map_err(|e| RuntimeError::Telemetry(e.to_string()))?;

    tracing::info!("tracing initialised");
    Ok(())
}
