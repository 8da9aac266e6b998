use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::constants::{
    DEFAULT_EXPIRY_HOURS, UPLOAD_FOUND_MESSAGE, UPLOAD_INSTRUCTIONS, UPLOAD_MISSING_MESSAGE,
};

/// Query parameters for upload URL generation
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct GenerateUploadUrlQuery {
    /// File extension for the video (e.g. mp4, mov, avi). Leading dots are ignored.
    #[serde(default)]
    pub file_extension: Option<String>,
    /// Number of hours the SAS token is valid (1-24 hours)
    #[serde(default = "default_expiry_hours")]
    #[validate(range(min = 1, max = 24, message = "expiry_hours must be between 1 and 24"))]
    pub expiry_hours: i64,
}

fn default_expiry_hours() -> i64 {
    DEFAULT_EXPIRY_HOURS
}

/// A freshly issued, write-only upload credential.
///
/// Never stored; it has no identity beyond `object_key` and simply expires.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadGrant {
    pub object_key: String,
    pub signed_url: String,
    pub container: String,
    /// Whole-second instant, identical to the `se` field embedded in `signed_url`.
    pub expires_at: DateTime<Utc>,
    pub public_url: String,
}

/// Response model for SAS URL generation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadUrlResponse {
    /// Unique name of the blob in Azure Storage
    pub blob_name: String,
    /// SAS URL for uploading the video
    pub sas_url: String,
    /// Azure Storage container name
    pub container_name: String,
    /// Expiry time of the SAS token (RFC 3339, UTC)
    pub expiry_time: String,
    /// Final blob URL (without SAS token)
    pub blob_url: String,
    /// Upload instructions
    pub message: String,
}

impl From<UploadGrant> for UploadUrlResponse {
    fn from(grant: UploadGrant) -> Self {
        Self {
            blob_name: grant.object_key,
            sas_url: grant.signed_url,
            container_name: grant.container,
            expiry_time: grant.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            blob_url: grant.public_url,
            message: UPLOAD_INSTRUCTIONS.to_string(),
        }
    }
}

/// Response model for upload verification
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyUploadResponse {
    pub exists: bool,
    pub blob_name: String,
    pub message: String,
}

impl VerifyUploadResponse {
    pub fn new(blob_name: impl Into<String>, exists: bool) -> Self {
        let message = if exists {
            UPLOAD_FOUND_MESSAGE
        } else {
            UPLOAD_MISSING_MESSAGE
        };
        Self {
            exists,
            blob_name: blob_name.into(),
            message: message.to_string(),
        }
    }
}
