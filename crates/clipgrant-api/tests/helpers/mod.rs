//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p clipgrant-api`.
//! The app runs on the in-memory backend, so no storage account is needed.

#![allow(dead_code)]

use axum_test::TestServer;
use chrono::{Duration, Utc};
use clipgrant_api::setup::routes;
use clipgrant_api::state::AppState;
use clipgrant_core::{Config, UploadServiceConfig};
use clipgrant_storage::MemoryStorage;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::collections::HashMap;
use std::sync::Arc;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Test application: server plus the fake provider behind it.
pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<MemoryStorage>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn create_test_config(extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("STORAGE_BACKEND".to_string(), "memory".to_string());
    vars.insert("AZURE_STORAGE_CONTAINER_NAME".to_string(), "videos".to_string());
    vars.insert("PROJECT_NAME".to_string(), "Clipgrant".to_string());
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }

    let inner = UploadServiceConfig::from_lookup(|key| vars.get(key).cloned())
        .expect("Failed to build test config");
    Config(Box::new(inner))
}

/// Setup test app without authentication.
pub fn setup_test_app() -> TestApp {
    setup_test_app_with(&[])
}

/// Setup test app with JWT authentication enabled.
pub fn setup_authenticated_test_app() -> TestApp {
    setup_test_app_with(&[("JWT_SECRET_KEY", TEST_JWT_SECRET)])
}

pub fn setup_test_app_with(extra: &[(&str, &str)]) -> TestApp {
    let config = create_test_config(extra);
    let storage = Arc::new(
        MemoryStorage::new(config.container_name()).expect("Failed to create memory storage"),
    );
    let state = Arc::new(AppState::new(config.clone(), storage.clone()));
    let router = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp { server, storage }
}

/// Setup a server backed by whatever `STORAGE_BACKEND` selects, as `main` would.
pub fn setup_server_with_configured_storage(extra: &[(&str, &str)]) -> TestServer {
    let config = create_test_config(extra);
    let storage = clipgrant_api::setup::storage::setup_storage(&config)
        .expect("Failed to create storage");
    let state = Arc::new(AppState::new(config.clone(), storage));
    let router = routes::setup_routes(&config, state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to start test server")
}

/// Sign a token the way the auth service issues them.
pub fn issue_token(user_id: i64, token_type: &str, ttl: Duration) -> String {
    let now = Utc::now();
    let claims = serde_json::json!({
        "user_id": user_id,
        "exp": (now + ttl).timestamp(),
        "iat": now.timestamp(),
        "type": token_type,
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign token")
}

/// Extract a decoded query parameter from a signed URL.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| {
            percent_encoding::percent_decode_str(value)
                .decode_utf8_lossy()
                .into_owned()
        })
    })
}
