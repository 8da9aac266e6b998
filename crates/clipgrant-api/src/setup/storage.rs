//! Storage setup and initialization

use anyhow::Result;
use clipgrant_core::Config;
use clipgrant_storage::{create_storage, Storage};
use std::sync::Arc;

/// Build the configured storage backend. No network call is made here.
pub fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage abstraction...");
    let storage = create_storage(config)?;
    tracing::info!(
        backend = %storage.backend_type(),
        container = %storage.container(),
        "Storage abstraction initialized successfully"
    );
    Ok(storage)
}
