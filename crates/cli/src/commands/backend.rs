//! Marketplace backend checks.

use bazaar_storefront::backend::{BackendClient, BackendError};
use bazaar_storefront::config::{ConfigError, StorefrontConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PingError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend unreachable: {0}")]
    Backend(#[from] BackendError),
}

/// Probe the configured backend and log the status it answered with.
///
/// Uses the same configuration as the storefront binary, so a passing ping
/// means the server would start against this backend.
///
/// # Errors
///
/// Returns an error if configuration is incomplete or the backend does not
/// answer below 500.
pub async fn ping() -> Result<(), PingError> {
    let config = StorefrontConfig::from_env()?;
    let client = BackendClient::new(&config.backend)?;

    tracing::info!(backend = %config.backend.base_url, "Pinging backend...");
    let status = client.ping().await?;
    tracing::info!(status, "Backend reachable");
    Ok(())
}
