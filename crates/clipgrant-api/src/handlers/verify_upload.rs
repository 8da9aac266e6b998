use crate::auth::CurrentUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use clipgrant_core::models::VerifyUploadResponse;
use std::sync::Arc;

/// Check whether a blob exists
///
/// A `false` result cannot tell a missing upload from one still in progress.
#[utoipa::path(
    get,
    path = "/verify-upload/{blob_name}",
    tag = "uploads",
    params(
        ("blob_name" = String, Path, description = "Blob name as returned by generate-upload-url; may contain '/'")
    ),
    responses(
        (status = 200, description = "Existence check result", body = VerifyUploadResponse),
        (status = 401, description = "Missing or invalid token (when auth is enabled)", body = ErrorResponse),
        (status = 500, description = "Storage provider failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip_all,
    fields(blob_name = %blob_name, user_id = ?user.user_id(), operation = "verify_upload")
)]
pub async fn verify_upload(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(blob_name): Path<String>,
) -> Result<Json<VerifyUploadResponse>, HttpAppError> {
    let response = state
        .upload_grants
        .check_upload_exists(&blob_name, user.user_id())
        .await?;

    Ok(Json(response))
}
