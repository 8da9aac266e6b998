//! Configuration module
//!
//! Configuration is read once at process start (from the environment, with `.env`
//! support) into an explicit `Config` value that is passed to the storage factory and
//! the HTTP layer. Nothing below the setup code reads the environment.

use std::collections::HashMap;
use std::env;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

use crate::constants::{EMULATOR_ACCOUNT_KEY, EMULATOR_ACCOUNT_NAME, EMULATOR_BLOB_URL};
use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 8000;
const STORAGE_REQUEST_TIMEOUT_SECS: u64 = 30;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const MEMORY_CONTAINER_NAME: &str = "videos";

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub project_name: String,
    pub host: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub log_format: String,
    /// Upper bound on in-flight HTTP requests.
    pub http_concurrency_limit: usize,
}

/// Azure storage account credentials and endpoint
#[derive(Clone)]
pub struct AzureConfig {
    pub account_name: String,
    /// Base64 account key, as shown in the portal.
    pub account_key: String,
    /// Base URL for blobs, without the container segment.
    /// `None` means `https://{account}.blob.core.windows.net`.
    pub blob_endpoint: Option<String>,
    pub use_emulator: bool,
}

impl std::fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureConfig")
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("blob_endpoint", &self.blob_endpoint)
            .field("use_emulator", &self.use_emulator)
            .finish()
    }
}

impl AzureConfig {
    /// Blob service base URL (no trailing slash).
    pub fn blob_endpoint(&self) -> String {
        match self.blob_endpoint {
            Some(ref endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.blob.core.windows.net", self.account_name),
        }
    }
}

/// Optional JWT authentication
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_algorithm: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .finish()
    }
}

/// Full service configuration
#[derive(Clone, Debug)]
pub struct UploadServiceConfig {
    pub base: BaseConfig,
    pub storage_backend: StorageBackend,
    pub container_name: String,
    pub azure: Option<AzureConfig>,
    pub storage_request_timeout_secs: u64,
    pub auth: Option<AuthConfig>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<UploadServiceConfig>);

impl Config {
    fn inner(&self) -> &UploadServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.inner().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = UploadServiceConfig::from_lookup(|key| env::var(key).ok())?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn project_name(&self) -> &str {
        &self.inner().base.project_name
    }

    pub fn host(&self) -> &str {
        &self.inner().base.host
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.inner().base.http_concurrency_limit
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn container_name(&self) -> &str {
        &self.inner().container_name
    }

    pub fn azure(&self) -> Option<&AzureConfig> {
        self.inner().azure.as_ref()
    }

    pub fn storage_request_timeout_secs(&self) -> u64 {
        self.inner().storage_request_timeout_secs
    }

    pub fn auth(&self) -> Option<&AuthConfig> {
        self.inner().auth.as_ref()
    }
}

fn is_production_env(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

fn parse_bool(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| v.trim().to_lowercase())
        .and_then(|v| match v.as_str() {
            "1" | "true" | "yes" => Some(true),
            "0" | "false" | "no" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

/// Fields recognised in an Azure storage connection string.
#[derive(Debug, Default, PartialEq)]
pub struct ConnectionString {
    pub account_name: Option<String>,
    pub account_key: Option<String>,
    pub blob_endpoint: Option<String>,
    pub use_development_storage: bool,
}

/// Parse `Key=Value;Key=Value` connection strings as issued by the Azure portal.
///
/// Account keys end in `=` padding, so each pair is split on the first `=` only.
pub fn parse_connection_string(raw: &str) -> Result<ConnectionString, anyhow::Error> {
    let mut pairs = HashMap::new();
    for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let (key, value) = segment.split_once('=').ok_or_else(|| {
            anyhow::anyhow!("Malformed connection string segment: '{}'", segment)
        })?;
        pairs.insert(key.trim().to_string(), value.trim().to_string());
    }

    let use_development_storage = pairs
        .get("UseDevelopmentStorage")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let account_name = pairs.get("AccountName").cloned();
    let blob_endpoint = match pairs.get("BlobEndpoint") {
        Some(endpoint) => Some(endpoint.clone()),
        None => match (account_name.as_ref(), pairs.get("EndpointSuffix")) {
            (Some(account), Some(suffix)) => {
                let protocol = pairs
                    .get("DefaultEndpointsProtocol")
                    .map(String::as_str)
                    .unwrap_or("https");
                Some(format!("{}://{}.blob.{}", protocol, account, suffix))
            }
            _ => None,
        },
    };

    Ok(ConnectionString {
        account_name,
        account_key: pairs.get("AccountKey").cloned(),
        blob_endpoint,
        use_development_storage,
    })
}

impl UploadServiceConfig {
    /// Build configuration from a key lookup. `Config::from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = var("ALLOWED_ORIGINS")
            .or_else(|| var("CORS_ORIGINS"))
            .unwrap_or_else(|| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "ALLOWED_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            project_name: var("PROJECT_NAME").unwrap_or_else(|| "Clipgrant".to_string()),
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: var("PORT")
                .unwrap_or_else(|| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            log_format: var("LOG_FORMAT")
                .unwrap_or_else(|| "text".to_string())
                .to_lowercase(),
            http_concurrency_limit: var("HTTP_CONCURRENCY_LIMIT")
                .unwrap_or_else(|| HTTP_CONCURRENCY_LIMIT.to_string())
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT must be a valid number"))?
                .max(1),
        };

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(s) => s.parse::<StorageBackend>()?,
            None => StorageBackend::Azure,
        };

        let connection = match var("AZURE_STORAGE_CONNECTION_STRING") {
            Some(raw) => parse_connection_string(&raw)?,
            None => ConnectionString::default(),
        };

        let use_emulator = parse_bool(var("AZURE_STORAGE_USE_EMULATOR"), false)
            || connection.use_development_storage;

        let azure = match storage_backend {
            StorageBackend::Azure => {
                let account_name = var("AZURE_STORAGE_ACCOUNT_NAME")
                    .or(connection.account_name)
                    .or_else(|| use_emulator.then(|| EMULATOR_ACCOUNT_NAME.to_string()))
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "AZURE_STORAGE_ACCOUNT_NAME or AZURE_STORAGE_CONNECTION_STRING must be set"
                        )
                    })?;
                let account_key = var("AZURE_STORAGE_ACCOUNT_KEY")
                    .or(connection.account_key)
                    .or_else(|| use_emulator.then(|| EMULATOR_ACCOUNT_KEY.to_string()))
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "AZURE_STORAGE_ACCOUNT_KEY or AZURE_STORAGE_CONNECTION_STRING must be set"
                        )
                    })?;
                let blob_endpoint = var("AZURE_STORAGE_ENDPOINT")
                    .or(connection.blob_endpoint)
                    .or_else(|| {
                        use_emulator.then(|| {
                            let base =
                                var("AZURITE_BLOB_STORAGE_URL").unwrap_or_else(|| EMULATOR_BLOB_URL.to_string());
                            format!("{}/{}", base.trim_end_matches('/'), account_name)
                        })
                    });

                Some(AzureConfig {
                    account_name,
                    account_key,
                    blob_endpoint,
                    use_emulator,
                })
            }
            StorageBackend::Memory => None,
        };

        let container_name = match storage_backend {
            StorageBackend::Azure => var("AZURE_STORAGE_CONTAINER_NAME")
                .ok_or_else(|| anyhow::anyhow!("AZURE_STORAGE_CONTAINER_NAME must be set"))?,
            StorageBackend::Memory => var("AZURE_STORAGE_CONTAINER_NAME")
                .unwrap_or_else(|| MEMORY_CONTAINER_NAME.to_string()),
        };

        let auth = var("JWT_SECRET_KEY").map(|jwt_secret| AuthConfig {
            jwt_secret,
            jwt_algorithm: var("JWT_ALGORITHM").unwrap_or_else(|| "HS256".to_string()),
        });

        let config = UploadServiceConfig {
            base,
            storage_backend,
            container_name,
            azure,
            storage_request_timeout_secs: var("STORAGE_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|| STORAGE_REQUEST_TIMEOUT_SECS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("STORAGE_REQUEST_TIMEOUT_SECS must be a valid number"))?,
            auth,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !is_valid_container_name(&self.container_name) {
            return Err(anyhow::anyhow!(
                "AZURE_STORAGE_CONTAINER_NAME '{}' is not a valid container name (3-63 lowercase letters, digits and single hyphens)",
                self.container_name
            ));
        }

        if let Some(ref azure) = self.azure {
            BASE64_STANDARD
                .decode(azure.account_key.as_bytes())
                .map_err(|e| anyhow::anyhow!("AZURE_STORAGE_ACCOUNT_KEY must be valid base64: {}", e))?;

            if let Some(ref endpoint) = azure.blob_endpoint {
                if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
                    return Err(anyhow::anyhow!(
                        "AZURE_STORAGE_ENDPOINT must be an http(s) URL, got '{}'",
                        endpoint
                    ));
                }
            }
        }

        if self.storage_request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("STORAGE_REQUEST_TIMEOUT_SECS cannot be 0"));
        }

        if let Some(ref auth) = self.auth {
            if !matches!(auth.jwt_algorithm.as_str(), "HS256" | "HS384" | "HS512") {
                return Err(anyhow::anyhow!(
                    "JWT_ALGORITHM must be one of HS256, HS384, HS512"
                ));
            }
            if is_production_env(&self.base.environment) && auth.jwt_secret.len() < 32 {
                return Err(anyhow::anyhow!(
                    "JWT_SECRET_KEY must be at least 32 characters long in production"
                ));
            }
        }

        Ok(())
    }
}

/// Azure container naming rules: 3-63 chars, lowercase letters, digits and hyphens,
/// starting and ending with a letter or digit, no consecutive hyphens.
fn is_valid_container_name(name: &str) -> bool {
    let len_ok = (3..=63).contains(&name.len());
    let chars_ok = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let edges_ok = !name.starts_with('-') && !name.ends_with('-');
    len_ok && chars_ok && edges_ok && !name.contains("--")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const KEY: &str = "c2VjcmV0LWtleS1mb3ItdGVzdHM=";

    #[test]
    fn test_from_lookup_azure_explicit_vars() {
        let config = UploadServiceConfig::from_lookup(lookup(&[
            ("AZURE_STORAGE_ACCOUNT_NAME", "clipacct"),
            ("AZURE_STORAGE_ACCOUNT_KEY", KEY),
            ("AZURE_STORAGE_CONTAINER_NAME", "uploads"),
        ]))
        .unwrap();

        assert_eq!(config.storage_backend, StorageBackend::Azure);
        assert_eq!(config.container_name, "uploads");
        assert_eq!(config.base.server_port, 8000);
        assert_eq!(config.base.host, "0.0.0.0");
        assert_eq!(config.base.cors_origins, vec!["*".to_string()]);
        assert!(config.auth.is_none());
        let azure = config.azure.unwrap();
        assert_eq!(azure.blob_endpoint(), "https://clipacct.blob.core.windows.net");
        assert!(!azure.use_emulator);
    }

    #[test]
    fn test_missing_credentials_fail_fast() {
        let err = UploadServiceConfig::from_lookup(lookup(&[(
            "AZURE_STORAGE_CONTAINER_NAME",
            "uploads",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("AZURE_STORAGE_ACCOUNT_NAME"));

        let err = UploadServiceConfig::from_lookup(lookup(&[
            ("AZURE_STORAGE_ACCOUNT_NAME", "clipacct"),
            ("AZURE_STORAGE_ACCOUNT_KEY", KEY),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("AZURE_STORAGE_CONTAINER_NAME"));
    }

    #[test]
    fn test_invalid_account_key_is_rejected() {
        let err = UploadServiceConfig::from_lookup(lookup(&[
            ("AZURE_STORAGE_ACCOUNT_NAME", "clipacct"),
            ("AZURE_STORAGE_ACCOUNT_KEY", "not base64!!"),
            ("AZURE_STORAGE_CONTAINER_NAME", "uploads"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("base64"));
    }

    #[test]
    fn test_invalid_container_name_is_rejected() {
        let err = UploadServiceConfig::from_lookup(lookup(&[
            ("AZURE_STORAGE_ACCOUNT_NAME", "clipacct"),
            ("AZURE_STORAGE_ACCOUNT_KEY", KEY),
            ("AZURE_STORAGE_CONTAINER_NAME", "Bad_Name"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("container name"));
    }

    #[test]
    fn test_connection_string_fills_account() {
        let conn = format!(
            "DefaultEndpointsProtocol=https;AccountName=connacct;AccountKey={};EndpointSuffix=core.windows.net",
            KEY
        );
        let config = UploadServiceConfig::from_lookup(lookup(&[
            ("AZURE_STORAGE_CONNECTION_STRING", conn.as_str()),
            ("AZURE_STORAGE_CONTAINER_NAME", "uploads"),
        ]))
        .unwrap();
        let azure = config.azure.unwrap();
        assert_eq!(azure.account_name, "connacct");
        assert_eq!(azure.account_key, KEY);
        assert_eq!(azure.blob_endpoint(), "https://connacct.blob.core.windows.net");
    }

    #[test]
    fn test_development_storage_uses_emulator_defaults() {
        let config = UploadServiceConfig::from_lookup(lookup(&[
            ("AZURE_STORAGE_CONNECTION_STRING", "UseDevelopmentStorage=true"),
            ("AZURE_STORAGE_CONTAINER_NAME", "uploads"),
        ]))
        .unwrap();
        let azure = config.azure.unwrap();
        assert!(azure.use_emulator);
        assert_eq!(azure.account_name, EMULATOR_ACCOUNT_NAME);
        assert_eq!(
            azure.blob_endpoint(),
            "http://127.0.0.1:10000/devstoreaccount1"
        );
    }

    #[test]
    fn test_parse_connection_string_keeps_key_padding() {
        let parsed =
            parse_connection_string("AccountName=a;AccountKey=abc==;BlobEndpoint=http://x/y").unwrap();
        assert_eq!(parsed.account_key.as_deref(), Some("abc=="));
        assert_eq!(parsed.blob_endpoint.as_deref(), Some("http://x/y"));
        assert!(parse_connection_string("AccountName").is_err());
    }

    #[test]
    fn test_memory_backend_needs_no_credentials() {
        let config =
            UploadServiceConfig::from_lookup(lookup(&[("STORAGE_BACKEND", "memory")])).unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert!(config.azure.is_none());
        assert_eq!(config.container_name, "videos");
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        let err = UploadServiceConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("ENVIRONMENT", "production"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("ALLOWED_ORIGINS"));
    }

    #[test]
    fn test_numeric_settings_fail_fast() {
        for (name, value) in [
            ("PORT", "http"),
            ("STORAGE_REQUEST_TIMEOUT_SECS", "thirty"),
            ("HTTP_CONCURRENCY_LIMIT", "lots"),
        ] {
            let err = UploadServiceConfig::from_lookup(lookup(&[
                ("STORAGE_BACKEND", "memory"),
                (name, value),
            ]))
            .unwrap_err();
            assert!(err.to_string().contains(name), "{}", err);
        }
    }

    #[test]
    fn test_numeric_settings_defaults_and_overrides() {
        let config =
            UploadServiceConfig::from_lookup(lookup(&[("STORAGE_BACKEND", "memory")])).unwrap();
        assert_eq!(config.storage_request_timeout_secs, 30);
        assert_eq!(config.base.http_concurrency_limit, 10_000);

        let config = UploadServiceConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("STORAGE_REQUEST_TIMEOUT_SECS", "5"),
            ("HTTP_CONCURRENCY_LIMIT", "64"),
        ]))
        .unwrap();
        assert_eq!(config.storage_request_timeout_secs, 5);
        assert_eq!(config.base.http_concurrency_limit, 64);
    }

    #[test]
    fn test_jwt_settings() {
        let config = UploadServiceConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET_KEY", "dev-secret"),
        ]))
        .unwrap();
        let auth = config.auth.unwrap();
        assert_eq!(auth.jwt_algorithm, "HS256");

        let err = UploadServiceConfig::from_lookup(lookup(&[
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET_KEY", "dev-secret"),
            ("JWT_ALGORITHM", "RS256"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("JWT_ALGORITHM"));
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let azure = AzureConfig {
            account_name: "clipacct".to_string(),
            account_key: KEY.to_string(),
            blob_endpoint: None,
            use_emulator: false,
        };
        let rendered = format!("{:?}", azure);
        assert!(!rendered.contains(KEY));
        assert!(rendered.contains("redacted"));
    }
}
