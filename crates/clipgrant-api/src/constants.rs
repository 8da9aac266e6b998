//! API constants

/// Prefix under which the upload routes are mounted in addition to the root.
pub const API_PREFIX: &str = "/api/video-upload";

pub const OPENAPI_JSON_PATH: &str = "/openapi.json";
pub const DOCS_PATH: &str = "/docs";

/// Cookie carrying the access token when the `Authorization` header is absent.
pub const AUTH_COOKIE_NAME: &str = "auth_token";

/// Only tokens with this `type` claim are accepted.
pub const ACCESS_TOKEN_TYPE: &str = "access";
