//! Route configuration and setup

use crate::api_doc::openapi_json;
use crate::auth::{auth_middleware, JwtVerifier};
use crate::constants::{API_PREFIX, DOCS_PATH, OPENAPI_JSON_PATH};
use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use clipgrant_core::Config;
use clipgrant_infra::request_id_middleware;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Setup all application routes
///
/// Upload routes are served at the root and again under `API_PREFIX`. Health and
/// documentation routes stay public when authentication is enabled.
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let mut upload_routes = upload_routes();
    if let Some(auth) = config.auth() {
        let verifier = Arc::new(JwtVerifier::new(auth)?);
        upload_routes = upload_routes.route_layer(axum::middleware::from_fn_with_state(
            verifier,
            auth_middleware,
        ));
        tracing::info!(algorithm = %auth.jwt_algorithm, "JWT authentication enabled");
    } else {
        tracing::info!("JWT authentication disabled");
    }

    let http_concurrency_limit = config.http_concurrency_limit();
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let app = Router::new()
        .route("/", get(handlers::health::health_check))
        .route("/health", get(handlers::health::health_check))
        .route(OPENAPI_JSON_PATH, get(openapi_json))
        .merge(upload_routes.clone())
        .nest(API_PREFIX, upload_routes)
        .merge(utoipa_rapidoc::RapiDoc::new(OPENAPI_JSON_PATH).path(DOCS_PATH))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

fn upload_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/generate-upload-url",
            get(handlers::upload_url::generate_upload_url),
        )
        .route(
            "/verify-upload/{*blob_name}",
            get(handlers::verify_upload::verify_upload),
        )
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
