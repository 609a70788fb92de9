//! Authentication service layer
//!
//! Business logic for user registration, login, logout, and profile lookup.
//! Logout revokes the presented access token by writing its `jti` to the
//! blacklist table with the token's own expiry, so the row becomes dead
//! weight exactly when the token does.

use super::jwt::generate_access_token;
use super::password::{hash_password, validate_password_strength, verify_password};
use crate::error::AppError;
use chrono::{DateTime, TimeZone, Utc};
use lotwise_core::AuthConfig;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Authentication response with the issued access token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserInfo,
}

/// User information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Internal user record from database
#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserInfo {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(pool: PgPool, config: AuthConfig) -> Self {
        Self { pool, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Register a new user
    ///
    /// Rejects mismatched password confirmation, weak passwords, and
    /// usernames or emails that are already taken.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserInfo, AppError> {
        request
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        if request.password != request.confirm_password {
            return Err(AppError::BadRequest("Passwords do not match".to_string()));
        }

        validate_password_strength(&request.password)
            .map_err(|e| AppError::BadRequest(format!("Password validation failed: {e}")))?;

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE username = $1 OR email = $2",
        )
        .bind(&request.username)
        .bind(&request.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to check existing user: {e}")))?;

        if existing > 0 {
            return Err(AppError::BadRequest(
                "Username or email already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?;

        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.username)
        .bind(&request.email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            // A concurrent registration can win between the COUNT check and
            // this INSERT; the unique constraint is the actual arbiter.
            Some(db) if db.is_unique_violation() => {
                AppError::BadRequest("Username or email already registered".to_string())
            }
            _ => AppError::Database(format!("Failed to create user: {e}")),
        })?;

        Ok(user.into())
    }

    /// Login with username and password, issuing a new access token
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(&request.username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch user: {e}")))?
        .ok_or(AppError::Unauthorized)?;

        let password_valid = verify_password(&request.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Failed to verify password: {e}")))?;

        if !password_valid {
            return Err(AppError::Unauthorized);
        }

        let access_token =
            generate_access_token(&self.config, user.id, &user.username, &user.email)
                .map_err(|e| AppError::Internal(format!("Failed to generate access token: {e}")))?;

        Ok(AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_lifetime_mins * 60,
            user: user.into(),
        })
    }

    /// Logout by blacklisting the presented access token
    ///
    /// The blacklist row expires when the token would have, which keeps the
    /// table bounded once expired rows are swept.
    pub async fn logout(&self, jti: &str, exp: u64) -> Result<(), AppError> {
        let expires_at = Utc
            .timestamp_opt(exp as i64, 0)
            .single()
            .unwrap_or_else(Utc::now);

        sqlx::query(
            r#"
            INSERT INTO token_blacklist (id, token_jti, blacklisted_at, expires_at)
            VALUES ($1, $2, NOW(), $3)
            ON CONFLICT (token_jti) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to blacklist token: {e}")))?;

        Ok(())
    }

    /// Get user info by user ID
    pub async fn get_user(&self, user_id: Uuid) -> Result<UserInfo, AppError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch user: {e}")))?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(user.into())
    }

    /// Check whether a token's `jti` has been blacklisted and is still live
    pub async fn is_token_blacklisted(&self, jti: &str) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM token_blacklist WHERE token_jti = $1 AND expires_at > NOW()",
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to check blacklist: {e}")))?;

        Ok(count > 0)
    }
}
