//! JWT token generation and validation
//!
//! Implements JWT-based authentication with HMAC-SHA256 signing. Access
//! tokens carry the user identity and a `jti` used for blacklisting.
//! Signature and expiry are checked here; the blacklist lookup happens in
//! the middleware so an expired token always reports as expired regardless
//! of blacklist state.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use lotwise_core::AuthConfig;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// JWT Claims structure containing user information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Subject - user ID
    pub sub: String,
    /// JWT ID - unique token identifier for blacklisting
    pub jti: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
    /// User's username
    pub username: String,
    /// User's email address
    pub email: String,
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

/// Generate a JWT access token for an authenticated user
///
/// The expiry window comes from `config.token_lifetime_mins`; the config is
/// handed in explicitly so nothing here reads ambient state.
pub fn generate_access_token(
    config: &AuthConfig,
    user_id: Uuid,
    username: &str,
    email: &str,
) -> Result<String, JwtError> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    let claims = Claims {
        iss: config.issuer.clone(),
        sub: user_id.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now,
        exp: now + config.token_lifetime_mins * 60,
        username: username.to_string(),
        email: email.to_string(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate a JWT access token and extract claims
///
/// Fails with `ExpiredToken` past expiry, `InvalidSignature` when tampered,
/// and `InvalidToken` for anything malformed.
pub fn validate_access_token(config: &AuthConfig, token: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        _ => JwtError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_validate_token() {
        let config = AuthConfig::default();
        let user_id = Uuid::new_v4();

        let token = generate_access_token(&config, user_id, "testuser", "test@example.com")
            .expect("Failed to generate token");

        let claims = validate_access_token(&config, &token).expect("Failed to validate token");

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.username, "testuser");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.iss, "lotwise-api");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_invalid_token() {
        let config = AuthConfig::default();
        let result = validate_access_token(&config, "invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let config1 = AuthConfig {
            secret: "secret1".to_string(),
            ..Default::default()
        };
        let config2 = AuthConfig {
            secret: "secret2".to_string(),
            ..Default::default()
        };

        let token =
            generate_access_token(&config1, Uuid::new_v4(), "test", "test@example.com").unwrap();

        let result = validate_access_token(&config2, &token);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_expired_token() {
        let config = AuthConfig::default();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        // Issued two hours ago, expired one hour ago.
        let claims = Claims {
            iss: config.issuer.clone(),
            sub: Uuid::new_v4().to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
            username: "test".to_string(),
            email: "test@example.com".to_string(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        let result = validate_access_token(&config, &token);
        assert!(matches!(result, Err(JwtError::ExpiredToken)));
    }
}
