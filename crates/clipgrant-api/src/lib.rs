//! Clipgrant API Library
//!
//! HTTP surface of the upload-credential service: handlers, the issuer service,
//! optional JWT authentication and application setup.

mod api_doc;
pub mod constants;
mod handlers;

// Public modules
pub mod auth;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::UploadGrantService;
pub use state::AppState;
