use crate::auth::CurrentUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedQuery};
use crate::state::AppState;
use axum::{extract::State, Json};
use clipgrant_core::models::{GenerateUploadUrlQuery, UploadUrlResponse};
use std::sync::Arc;

/// Generate a write-only SAS URL for uploading one video
///
/// The returned URL allows create + write on a single fresh blob until `expiry_time`.
#[utoipa::path(
    get,
    path = "/generate-upload-url",
    tag = "uploads",
    params(GenerateUploadUrlQuery),
    responses(
        (status = 200, description = "Upload URL generated", body = UploadUrlResponse),
        (status = 401, description = "Missing or invalid token (when auth is enabled)", body = ErrorResponse),
        (status = 422, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Storage provider failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip_all,
    fields(
        user_id = ?user.user_id(),
        expiry_hours = query.expiry_hours,
        operation = "generate_upload_url"
    )
)]
pub async fn generate_upload_url(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    ValidatedQuery(query): ValidatedQuery<GenerateUploadUrlQuery>,
) -> Result<Json<UploadUrlResponse>, HttpAppError> {
    let grant = state
        .upload_grants
        .generate_upload_grant(
            query.file_extension.as_deref(),
            query.expiry_hours,
            user.user_id(),
        )
        .await?;

    Ok(Json(UploadUrlResponse::from(grant)))
}
