//! Storage abstraction trait
//!
//! This module defines the capability every storage backend must provide.

use crate::sas::{SasPermissions, SasVerifyError};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Access denied: {0}")]
    AccessDenied(#[from] SasVerifyError),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage capability used by the upload service.
///
/// Only two operations reach the provider: minting a signed URL for one key, and
/// asking whether a key currently exists. The service never moves bytes itself.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Produce a signed URL for `storage_key` granting exactly `permissions` until
    /// `expires_at`. The expiry must already be truncated to whole seconds; it is
    /// embedded in the token verbatim.
    async fn signed_url(
        &self,
        storage_key: &str,
        permissions: SasPermissions,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<String>;

    /// Point-in-time existence check in the configured container.
    ///
    /// Cannot tell an in-flight or truncated upload from a missing one.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Unsigned URL of the object.
    fn blob_url(&self, storage_key: &str) -> String;

    /// Name of the configured container.
    fn container(&self) -> &str;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
