//! Shared constants

/// Top-level folder for every issued object key.
pub const UPLOAD_KEY_PREFIX: &str = "videos";

/// Extension used when the caller does not supply one.
pub const DEFAULT_FILE_EXTENSION: &str = "mp4";

pub const MAX_FILE_EXTENSION_LEN: usize = 16;

/// Bounds for the lifetime of an upload grant, in hours.
pub const MIN_EXPIRY_HOURS: i64 = 1;
pub const MAX_EXPIRY_HOURS: i64 = 24;
pub const DEFAULT_EXPIRY_HOURS: i64 = 1;

/// Well-known Azurite development account.
///
/// See <https://learn.microsoft.com/azure/storage/common/storage-use-azurite#well-known-storage-account-and-key>
pub const EMULATOR_ACCOUNT_NAME: &str = "devstoreaccount1";
pub const EMULATOR_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
pub const EMULATOR_BLOB_URL: &str = "http://127.0.0.1:10000";

pub const UPLOAD_INSTRUCTIONS: &str = "Use the 'sas_url' to upload your video file directly to Azure Blob Storage. \
Make a PUT request with 'x-ms-blob-type: BlockBlob' header and the video file as body.";

pub const UPLOAD_FOUND_MESSAGE: &str = "Video uploaded successfully";
pub const UPLOAD_MISSING_MESSAGE: &str = "Video not found or upload incomplete";
