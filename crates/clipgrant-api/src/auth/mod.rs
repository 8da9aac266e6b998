//! Optional JWT authentication
//!
//! Enabled only when `JWT_SECRET_KEY` is configured. Authenticated callers get their
//! upload keys scoped under `videos/{user_id}/`.

pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::JwtVerifier;
pub use middleware::auth_middleware;
pub use models::{AuthUser, Claims, CurrentUser};
