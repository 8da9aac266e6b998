//! Clipgrant Storage Library
//!
//! This crate provides the narrow storage capability the upload service depends on
//! (mint a scoped signed URL, check whether a key exists) and its implementations for
//! Azure Blob Storage and an in-process fake.
//!
//! # Key format
//!
//! Upload keys live under `videos/`:
//!
//! - **Anonymous callers**: `videos/{yyyyMMddHHmmss}_{8 hex}.{ext}`
//! - **Authenticated callers**: `videos/{user_id}/{yyyyMMddHHmmss}_{8 hex}.{ext}`
//!
//! Key generation is centralized in the `keys` module so every caller agrees on it.

#[cfg(feature = "storage-azure")]
pub mod azure;
pub mod factory;
pub mod keys;
#[cfg(feature = "storage-memory")]
pub mod memory;
pub mod sas;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-azure")]
pub use azure::AzureBlobStorage;
pub use clipgrant_core::StorageBackend;
pub use factory::create_storage;
pub use keys::{generate_upload_key, resolve_upload_key};
#[cfg(feature = "storage-memory")]
pub use memory::MemoryStorage;
pub use sas::{SasPermissions, SasSigner, SasVerifyError};
pub use traits::{Storage, StorageError, StorageResult};
