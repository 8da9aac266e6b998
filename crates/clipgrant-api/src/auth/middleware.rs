use crate::auth::jwt::JwtVerifier;
use crate::constants::AUTH_COOKIE_NAME;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use clipgrant_core::AppError;
use std::sync::Arc;

/// Pull the access token from `Authorization: Bearer` or, failing that, the auth cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == AUTH_COOKIE_NAME)
        .map(|(_, value)| value.trim().to_string())
        .filter(|t| !t.is_empty())
}

pub async fn auth_middleware(
    State(verifier): State<Arc<JwtVerifier>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(request.headers()) else {
        tracing::debug!(path = %request.uri().path(), "Request without credentials");
        return HttpAppError(AppError::Unauthorized("Not authenticated".to_string()))
            .into_response();
    };

    match verifier.verify(&token) {
        Ok(user) => {
            tracing::debug!(user_id = user.user_id, "Request authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
