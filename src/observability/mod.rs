//! # Observability Infrastructure
//!
//! Structured logging setup for the sealbox service using the tracing
//! ecosystem.

use crate::errors::{Error, Result};
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber
///
/// Filter resolution order: `RUST_LOG`, then `SEALBOX_LOG_LEVEL`, then `info`.
pub fn init_tracing() -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let level = std::env::var("SEALBOX_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
            EnvFilter::try_new(level)
                .map_err(|e| Error::config(format!("Invalid log filter: {}", e)))?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| Error::config(format!("Failed to initialize tracing: {}", e)))?;

    Ok(())
}
