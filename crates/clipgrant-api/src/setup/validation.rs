//! Configuration validation
//!
//! Startup checks beyond what `Config::validate` enforces on individual values.

use anyhow::Result;
use clipgrant_core::{Config, StorageBackend};

/// Validate critical configuration values
///
/// Fails on combinations that are unsafe in production and warns about the rest.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();

    if is_production && config.storage_backend() == StorageBackend::Memory {
        return Err(anyhow::anyhow!(
            "STORAGE_BACKEND=memory cannot be used in production: issued URLs would not be reachable"
        ));
    }

    if is_production && config.auth().is_none() {
        tracing::warn!(
            "JWT_SECRET_KEY not set in production - upload URLs can be requested anonymously"
        );
    }

    if let Some(azure) = config.azure() {
        if azure.use_emulator {
            tracing::warn!(
                endpoint = %azure.blob_endpoint(),
                "Using the Azure storage emulator"
            );
        }
    }

    Ok(())
}
