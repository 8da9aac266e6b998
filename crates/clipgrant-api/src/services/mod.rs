pub mod upload_grant;

pub use upload_grant::UploadGrantService;
