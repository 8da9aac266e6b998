pub mod upload;

pub use upload::{
    GenerateUploadUrlQuery, UploadGrant, UploadUrlResponse, VerifyUploadResponse,
};
