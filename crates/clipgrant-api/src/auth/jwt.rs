use crate::auth::models::{AuthUser, Claims};
use crate::constants::ACCESS_TOKEN_TYPE;
use clipgrant_core::{AppError, AuthConfig};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use std::str::FromStr;

/// Validates HMAC-signed access tokens
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &AuthConfig) -> Result<Self, anyhow::Error> {
        let algorithm = Algorithm::from_str(&config.jwt_algorithm).map_err(|e| {
            anyhow::anyhow!("Unsupported JWT_ALGORITHM '{}': {}", config.jwt_algorithm, e)
        })?;

        let mut validation = Validation::new(algorithm);
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        })
    }

    /// Decode and check a token. Expired, tampered and non-access tokens are rejected.
    pub fn verify(&self, token: &str) -> Result<AuthUser, AppError> {
        let token_data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::Unauthorized("Token has expired".to_string()),
                _ => AppError::Unauthorized("Invalid token".to_string()),
            }
        })?;

        if token_data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AppError::Unauthorized("Invalid token type".to_string()));
        }

        Ok(AuthUser {
            user_id: token_data.claims.user_id,
        })
    }
}
