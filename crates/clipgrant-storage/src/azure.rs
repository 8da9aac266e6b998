use crate::sas::{encode_blob_path, SasPermissions, SasSigner};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clipgrant_core::AzureConfig;
use object_store::azure::{MicrosoftAzure, MicrosoftAzureBuilder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ClientOptions, ObjectStoreExt, RetryConfig};
use std::time::Duration;

/// Azure Blob Storage implementation
///
/// Signed URLs are minted locally from the account key. Only `exists` talks to the
/// service, through `object_store`.
pub struct AzureBlobStorage {
    store: MicrosoftAzure,
    signer: SasSigner,
    container: String,
    endpoint: String,
    https_only: bool,
}

impl AzureBlobStorage {
    /// Create a new AzureBlobStorage instance
    ///
    /// # Arguments
    /// * `config` - Account credentials and optional endpoint override
    ///   (e.g. "http://127.0.0.1:10000/devstoreaccount1" for Azurite)
    /// * `container` - Container every key is resolved against
    /// * `request_timeout` - Upper bound for a single call to the blob service
    pub fn new(
        config: &AzureConfig,
        container: String,
        request_timeout: Duration,
    ) -> StorageResult<Self> {
        let signer = SasSigner::new(config.account_name.clone(), &config.account_key)?;
        let endpoint = config.blob_endpoint();

        // A failed existence check is reported straight back to the caller, who can retry.
        let retry = RetryConfig {
            max_retries: 0,
            ..Default::default()
        };

        let mut builder = MicrosoftAzureBuilder::new()
            .with_account(config.account_name.clone())
            .with_access_key(config.account_key.clone())
            .with_container_name(container.clone())
            .with_client_options(ClientOptions::new().with_timeout(request_timeout))
            .with_retry(retry);

        if config.blob_endpoint.is_some() {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        // Azurite only speaks plain HTTP, so the token cannot insist on HTTPS there.
        let https_only = endpoint.starts_with("https://");

        tracing::info!(
            account = %config.account_name,
            container = %container,
            endpoint = %endpoint,
            emulator = config.use_emulator,
            "Azure blob storage initialized"
        );

        Ok(AzureBlobStorage {
            store,
            signer,
            container,
            endpoint,
            https_only,
        })
    }
}

#[async_trait]
impl Storage for AzureBlobStorage {
    async fn signed_url(
        &self,
        storage_key: &str,
        permissions: SasPermissions,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<String> {
        if storage_key.is_empty() {
            return Err(StorageError::InvalidKey("empty key".to_string()));
        }

        let query = self
            .signer
            .sign(&self.container, storage_key, permissions, expires_at, self.https_only)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    container = %self.container,
                    key = %storage_key,
                    "SAS signing failed"
                );
                e
            })?;

        Ok(format!("{}?{}", self.blob_url(storage_key), query))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let location = Path::from(storage_key.to_string());
        let start = std::time::Instant::now();

        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    container = %self.container,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Azure existence check failed"
                );
                Err(StorageError::BackendError(e.to_string()))
            }
        }
    }

    fn blob_url(&self, storage_key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint,
            self.container,
            encode_blob_path(storage_key)
        )
    }

    fn container(&self) -> &str {
        &self.container
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Azure
    }
}
