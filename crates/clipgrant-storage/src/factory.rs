#[cfg(feature = "storage-azure")]
use crate::AzureBlobStorage;
#[cfg(feature = "storage-memory")]
use crate::MemoryStorage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use clipgrant_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-azure")]
        StorageBackend::Azure => {
            let azure = config.azure().ok_or_else(|| {
                StorageError::ConfigError("Azure storage account not configured".to_string())
            })?;
            let timeout = std::time::Duration::from_secs(config.storage_request_timeout_secs());

            let storage =
                AzureBlobStorage::new(azure, config.container_name().to_string(), timeout)?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-azure"))]
        StorageBackend::Azure => Err(StorageError::ConfigError(
            "Azure storage backend not available (storage-azure feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-memory")]
        StorageBackend::Memory => {
            tracing::warn!(
                container = %config.container_name(),
                "Using in-memory storage; issued URLs are not reachable from outside this process"
            );
            let storage = MemoryStorage::new(config.container_name())?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-memory"))]
        StorageBackend::Memory => Err(StorageError::ConfigError(
            "Memory storage backend not available (storage-memory feature not enabled)".to_string(),
        )),
    }
}
