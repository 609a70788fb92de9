//! Authentication middleware for protecting routes
//!
//! Extracts and validates the bearer token from the Authorization header,
//! then checks the blacklist so logged-out tokens stop working immediately.
//! Signature and expiry are checked first: an expired token reports as
//! expired even when its `jti` is also blacklisted.

use super::jwt::{validate_access_token, Claims, JwtError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Authenticated user information extracted from a validated token
///
/// Inserted into request extensions by `auth_middleware`; handlers pull it
/// out with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// User's unique identifier
    pub user_id: Uuid,
    /// User's username
    pub username: String,
    /// User's email address
    pub email: String,
    /// JWT token ID, used when revoking this token on logout
    pub jti: String,
    /// Token expiry (Unix epoch seconds)
    pub exp: u64,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: Uuid::parse_str(&claims.sub).unwrap_or_else(|_| Uuid::nil()),
            username: claims.username,
            email: claims.email,
            jti: claims.jti,
            exp: claims.exp,
        }
    }
}

/// Authentication middleware errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Blacklist lookup failed: {0}")]
    BlacklistUnavailable(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::MissingAuthHeader => (
                StatusCode::UNAUTHORIZED,
                "MISSING_AUTH_HEADER",
                "Missing Authorization header".to_string(),
            ),
            AuthError::InvalidAuthHeader => (
                StatusCode::UNAUTHORIZED,
                "INVALID_AUTH_HEADER",
                "Invalid Authorization header format".to_string(),
            ),
            AuthError::InvalidToken(JwtError::ExpiredToken) => (
                StatusCode::UNAUTHORIZED,
                "EXPIRED_TOKEN",
                "Token has expired".to_string(),
            ),
            AuthError::InvalidToken(JwtError::InvalidSignature) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_SIGNATURE",
                "Invalid token signature".to_string(),
            ),
            AuthError::InvalidToken(_) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "Invalid token".to_string(),
            ),
            AuthError::TokenRevoked => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_REVOKED",
                "Token has been revoked".to_string(),
            ),
            AuthError::BlacklistUnavailable(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "BLACKLIST_UNAVAILABLE",
                format!("Blacklist lookup failed: {msg}"),
            ),
        };

        let body = serde_json::json!({
            "code": code,
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Authentication middleware that requires a valid, unrevoked access token
///
/// On success, `AuthenticatedUser` is inserted into request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?;

    let claims = validate_access_token(&state.config.auth, token)?;

    let revoked = state
        .auth
        .is_token_blacklisted(&claims.jti)
        .await
        .map_err(|e| AuthError::BlacklistUnavailable(format!("{e:?}")))?;

    if revoked {
        tracing::debug!(jti = %claims.jti, "rejected revoked token");
        return Err(AuthError::TokenRevoked);
    }

    request
        .extensions_mut()
        .insert(AuthenticatedUser::from(claims));

    Ok(next.run(request).await)
}
