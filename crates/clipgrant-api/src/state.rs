//! Application state shared by all handlers.

use crate::services::UploadGrantService;
use clipgrant_core::Config;
use clipgrant_storage::Storage;
use std::sync::Arc;

/// Immutable after startup; cloned into handlers behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub upload_grants: UploadGrantService,
}

impl AppState {
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Self {
        Self {
            upload_grants: UploadGrantService::new(storage.clone()),
            config,
            storage,
        }
    }
}
