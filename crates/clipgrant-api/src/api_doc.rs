//! OpenAPI documentation.
//!
//! Handler paths are documented at the root. The same routes are also served under
//! `crate::constants::API_PREFIX`.

use axum::Json;
use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use clipgrant_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clipgrant API",
        version = "0.1.0",
        description = "Issues time-limited, write-only SAS URLs for uploading videos directly to Azure Blob Storage, and checks whether an upload landed."
    ),
    paths(
        handlers::upload_url::generate_upload_url,
        handlers::verify_upload::verify_upload,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::UploadUrlResponse,
            models::VerifyUploadResponse,
            handlers::health::HealthResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "uploads", description = "Upload URL issuance and verification"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI document as JSON
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
