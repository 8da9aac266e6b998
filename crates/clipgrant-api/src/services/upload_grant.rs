//! Upload-credential issuance and post-hoc existence checks.

use std::sync::Arc;

use chrono::{Duration, Utc};
use clipgrant_core::constants::{MAX_EXPIRY_HOURS, MIN_EXPIRY_HOURS};
use clipgrant_core::models::{UploadGrant, VerifyUploadResponse};
use clipgrant_core::validation::normalize_file_extension;
use clipgrant_core::AppError;
use clipgrant_storage::sas::truncate_to_seconds;
use clipgrant_storage::{
    generate_upload_key, resolve_upload_key, SasPermissions, Storage, StorageError,
};

/// Issues write-only upload grants and checks whether they were used.
///
/// Holds no state of its own. Grants are not recorded anywhere; they simply expire.
#[derive(Clone)]
pub struct UploadGrantService {
    storage: Arc<dyn Storage>,
}

impl UploadGrantService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Derive a fresh object key and mint a create+write URL for it.
    pub async fn generate_upload_grant(
        &self,
        file_extension: Option<&str>,
        expiry_hours: i64,
        user_id: Option<i64>,
    ) -> Result<UploadGrant, AppError> {
        if !(MIN_EXPIRY_HOURS..=MAX_EXPIRY_HOURS).contains(&expiry_hours) {
            return Err(AppError::Validation(format!(
                "expiry_hours must be between {} and {}",
                MIN_EXPIRY_HOURS, MAX_EXPIRY_HOURS
            )));
        }
        let extension = normalize_file_extension(file_extension)?;

        let now = Utc::now();
        let object_key = generate_upload_key(user_id, &extension, now);
        let expires_at = truncate_to_seconds(now + Duration::hours(expiry_hours));

        let signed_url = self
            .storage
            .signed_url(&object_key, SasPermissions::create_write(), expires_at)
            .await
            .map_err(|e| storage_failure("Failed to generate upload URL", e))?;

        tracing::info!(
            key = %object_key,
            container = %self.storage.container(),
            expiry_hours = expiry_hours,
            expires_at = %expires_at,
            user_id = ?user_id,
            "Upload URL issued"
        );

        Ok(UploadGrant {
            public_url: self.storage.blob_url(&object_key),
            container: self.storage.container().to_string(),
            object_key,
            signed_url,
            expires_at,
        })
    }

    /// Point-in-time check for an object under `blob_name`.
    ///
    /// The response echoes `blob_name` as sent; the lookup uses the resolved key.
    pub async fn check_upload_exists(
        &self,
        blob_name: &str,
        user_id: Option<i64>,
    ) -> Result<VerifyUploadResponse, AppError> {
        if blob_name.trim_matches('/').is_empty() {
            return Err(AppError::Validation("blob_name must not be empty".to_string()));
        }

        let object_key = resolve_upload_key(blob_name, user_id);
        let exists = self
            .storage
            .exists(&object_key)
            .await
            .map_err(|e| storage_failure("Failed to verify upload", e))?;

        tracing::debug!(key = %object_key, exists = exists, "Upload existence checked");

        Ok(VerifyUploadResponse::new(blob_name, exists))
    }
}

/// Map a backend failure onto the error the caller sees.
///
/// Provider failures keep their cause behind the operation prefix. A backend that
/// cannot use its own settings is a configuration error, and a key the backend
/// refuses is the caller's input problem.
fn storage_failure(operation: &str, err: StorageError) -> AppError {
    match err {
        StorageError::InvalidKey(msg) => AppError::Validation(msg),
        StorageError::ConfigError(msg) => AppError::Config(msg),
        other => AppError::Storage(format!("{}: {}", operation, other)),
    }
}
