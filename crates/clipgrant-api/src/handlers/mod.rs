pub mod health;
pub mod upload_url;
pub mod verify_upload;
