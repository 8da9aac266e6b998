use crate::sas::{decode_blob_path, encode_blob_path, SasPermissions, SasSigner, SasVerifyError};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload};
use std::sync::Arc;
use uuid::Uuid;

const MEMORY_ACCOUNT_NAME: &str = "memoryaccount";

/// In-process storage backend for tests and local runs without an Azure account.
///
/// Issues real SAS tokens under a random per-instance key and enforces them on
/// `put_with_signed_url` the same way the blob service would: signature, expiry
/// and permissions.
#[derive(Clone)]
pub struct MemoryStorage {
    store: Arc<InMemory>,
    signer: SasSigner,
    container: String,
    endpoint: String,
}

impl MemoryStorage {
    pub fn new(container: impl Into<String>) -> StorageResult<Self> {
        let account_key = BASE64_STANDARD.encode(Uuid::new_v4().as_bytes());
        let signer = SasSigner::new(MEMORY_ACCOUNT_NAME, &account_key)?;

        Ok(MemoryStorage {
            store: Arc::new(InMemory::new()),
            signer,
            container: container.into(),
            endpoint: format!("https://{}.blob.memory.local", MEMORY_ACCOUNT_NAME),
        })
    }

    /// Emulate a client `PUT` against a signed URL issued by this backend.
    ///
    /// `now` is the instant the request is considered to arrive, so expiry can be
    /// exercised without waiting.
    pub async fn put_with_signed_url(
        &self,
        signed_url: &str,
        data: Bytes,
        now: DateTime<Utc>,
    ) -> StorageResult<()> {
        let (base, query) = signed_url
            .split_once('?')
            .ok_or(StorageError::AccessDenied(SasVerifyError::MissingParameter("sig")))?;

        let prefix = format!("{}/{}/", self.endpoint, self.container);
        let storage_key = base
            .strip_prefix(&prefix)
            .and_then(decode_blob_path)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                StorageError::InvalidKey(format!("URL does not address container '{}'", self.container))
            })?;

        self.signer.verify(
            &self.container,
            &storage_key,
            query,
            SasPermissions::create_write(),
            now,
        )?;

        let size = data.len();
        self.store
            .put(&Path::from(storage_key.clone()), PutPayload::from(data))
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        tracing::debug!(
            container = %self.container,
            key = %storage_key,
            size_bytes = size,
            "In-memory upload stored"
        );

        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
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
            .sign(&self.container, storage_key, permissions, expires_at, false)?;
        Ok(format!("{}?{}", self.blob_url(storage_key), query))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let location = Path::from(storage_key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
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
        StorageBackend::Memory
    }
}
