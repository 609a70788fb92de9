//! Authentication module
//!
//! JWT-based authentication with the following components:
//! - Token generation and validation
//! - Password hashing with Argon2
//! - Middleware for request authentication with blacklist checks
//! - Authentication service for registration, login, and logout

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use jwt::{generate_access_token, validate_access_token, Claims, JwtError};
pub use middleware::{auth_middleware, AuthError, AuthenticatedUser};
pub use password::{hash_password, validate_password_strength, verify_password};
pub use service::{AuthResponse, AuthService, LoginRequest, RegisterRequest, UserInfo};
