//! API Integration Tests
//!
//! Note: Tests marked with #[ignore] require a real database connection.
//! To run them, set up a PostGIS database, apply migrations/0001_init.sql,
//! and run: cargo test -- --ignored

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use lotwise_api::auth::Claims;
use lotwise_api::create_router_for_testing;
use lotwise_core::AuthConfig;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;
use uuid::Uuid;

/// Helper to create a test request
fn create_json_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    match body {
        Some(json_body) => builder
            .body(Body::from(serde_json::to_string(&json_body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Sign a token with the default test secret, expired an hour ago.
fn expired_token() -> String {
    let config = AuthConfig::default();
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();

    let claims = Claims {
        iss: config.issuer.clone(),
        sub: Uuid::new_v4().to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now - 7200,
        exp: now - 3600,
        username: "expired".to_string(),
        email: "expired@example.com".to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .unwrap()
}

// =============================================================================
// Health Check Tests
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert!(json["uptime_seconds"].is_number());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_readiness_check() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["ready"], true);
    assert_eq!(json["checks"]["database"], true);
}

// =============================================================================
// Authentication Rejection Tests (no database needed)
// =============================================================================

#[tokio::test]
async fn test_protected_route_without_auth_returns_401() {
    let app = create_router_for_testing();

    let request = create_json_request(
        "POST",
        "/api/v1/query",
        Some(json!({
            "question": "What schools are near 4510 Main St?"
        })),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "MISSING_AUTH_HEADER");
}

#[tokio::test]
async fn test_malformed_auth_header_returns_401() {
    let app = create_router_for_testing();

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/auth/me")
        .header("Authorization", "Token abc123")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_AUTH_HEADER");
}

#[tokio::test]
async fn test_invalid_token_returns_401() {
    let app = create_router_for_testing();

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/auth/me")
        .header("Authorization", "Bearer invalid.jwt.token")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_returns_401_with_expired_code() {
    let app = create_router_for_testing();

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/auth/me")
        .header("Authorization", format!("Bearer {}", expired_token()))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "EXPIRED_TOKEN");
}

#[tokio::test]
async fn test_typed_endpoint_without_auth_returns_401() {
    let app = create_router_for_testing();

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/properties/assessment?address=4510%20Main%20St")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Authentication Flow Tests
// =============================================================================

async fn register_and_login(app: &axum::Router, username: &str) -> String {
    let register = create_json_request(
        "POST",
        "/api/v1/auth/register",
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "SecurePass123",
            "confirm_password": "SecurePass123"
        })),
    );
    let response = app.clone().oneshot(register).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let login = create_json_request(
        "POST",
        "/api/v1/auth/login",
        Some(json!({
            "username": username,
            "password": "SecurePass123"
        })),
    );
    let response = app.clone().oneshot(login).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    json["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_register_success() {
    let app = create_router_for_testing();

    let request = create_json_request(
        "POST",
        "/api/v1/auth/register",
        Some(json!({
            "username": "newuser",
            "email": "newuser@example.com",
            "password": "SecurePass123",
            "confirm_password": "SecurePass123"
        })),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert!(json["user_id"].is_string());
    assert_eq!(json["username"], "newuser");
    assert_eq!(json["email"], "newuser@example.com");
    assert_eq!(json["message"], "Registration successful");
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_register_password_mismatch() {
    let app = create_router_for_testing();

    let request = create_json_request(
        "POST",
        "/api/v1/auth/register",
        Some(json!({
            "username": "mismatch",
            "email": "mismatch@example.com",
            "password": "SecurePass123",
            "confirm_password": "DifferentPass456"
        })),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["message"].as_str().unwrap().contains("do not match"));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_register_weak_password() {
    let app = create_router_for_testing();

    let request = create_json_request(
        "POST",
        "/api/v1/auth/register",
        Some(json!({
            "username": "weakpass",
            "email": "weakpass@example.com",
            "password": "weak",
            "confirm_password": "weak"
        })),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("Password validation failed"));
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_register_duplicate_username() {
    let app = create_router_for_testing();

    register_and_login(&app, "duplicate").await;

    let request = create_json_request(
        "POST",
        "/api/v1/auth/register",
        Some(json!({
            "username": "duplicate",
            "email": "other@example.com",
            "password": "SecurePass123",
            "confirm_password": "SecurePass123"
        })),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_concurrent_duplicate_registration_never_500s() {
    let app = create_router_for_testing();

    let make_request = || {
        create_json_request(
            "POST",
            "/api/v1/auth/register",
            Some(json!({
                "username": "racer",
                "email": "racer@example.com",
                "password": "SecurePass123",
                "confirm_password": "SecurePass123"
            })),
        )
    };

    let (first, second) = tokio::join!(
        app.clone().oneshot(make_request()),
        app.clone().oneshot(make_request())
    );

    // Whichever request loses the race gets the same 400 a sequential
    // duplicate would; the unique constraint must not surface as a 500.
    let mut statuses = [first.unwrap().status(), second.unwrap().status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_login_wrong_password() {
    let app = create_router_for_testing();

    register_and_login(&app, "wrongpass").await;

    let request = create_json_request(
        "POST",
        "/api/v1/auth/login",
        Some(json!({
            "username": "wrongpass",
            "password": "NotThePassword1"
        })),
    );

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_me_endpoint_returns_user_info() {
    let app = create_router_for_testing();

    let token = register_and_login(&app, "metest").await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/auth/me")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["username"], "metest");
    assert_eq!(json["email"], "metest@example.com");
    assert!(json["id"].is_string());
    assert!(json["created_at"].is_string());
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_logout_invalidates_token() {
    let app = create_router_for_testing();

    let token = register_and_login(&app, "logouttest").await;

    let logout = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/logout")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(logout).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["message"], "Logged out successfully");

    // The same token must now be rejected.
    let me = Request::builder()
        .method("GET")
        .uri("/api/v1/auth/me")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(me).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKEN_REVOKED");
}

// =============================================================================
// Query API Tests
// =============================================================================

#[tokio::test]
#[ignore = "requires database"]
async fn test_query_empty_question() {
    let app = create_router_for_testing();

    let token = register_and_login(&app, "emptyq").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/query")
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(
            serde_json::to_string(&json!({"question": "   "})).unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires database"]
async fn test_query_requires_question_or_kind() {
    let app = create_router_for_testing();

    let token = register_and_login(&app, "badmix").await;

    // kind without address is rejected before any lookup.
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/query")
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(
            serde_json::to_string(&json!({"kind": "assessment"})).unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires database and seed data"]
async fn test_structured_query_answers() {
    let app = create_router_for_testing();

    let token = register_and_login(&app, "seeduser").await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/query")
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(
            serde_json::to_string(&json!({
                "kind": "assessment",
                "address": "4510 Main St"
            }))
            .unwrap(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["kind"], "assessment");
    assert_eq!(json["payload"]["kind"], "assessment");
    assert!(json["property"]["id"].is_number());
    assert!(json["processing_time_ms"].is_number());
}

#[tokio::test]
#[ignore = "requires database and seed data"]
async fn test_unknown_address_returns_404() {
    let app = create_router_for_testing();

    let token = register_and_login(&app, "missing").await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/properties/zoning?address=99999%20Nowhere%20Blvd")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
#[ignore = "requires database and seed data"]
async fn test_schools_endpoint_returns_sorted_list() {
    let app = create_router_for_testing();

    let token = register_and_login(&app, "schools").await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/properties/schools?address=4510%20Main%20St")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["payload"]["kind"], "nearby_schools");

    let schools = json["payload"]["data"].as_array().unwrap();
    let distances: Vec<f64> = schools
        .iter()
        .map(|s| s["distance_m"].as_f64().unwrap())
        .collect();
    let mut sorted = distances.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(distances, sorted);
}

// =============================================================================
// OpenAPI/Swagger Tests
// =============================================================================

#[tokio::test]
async fn test_swagger_ui_available() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::OK || response.status() == StatusCode::MOVED_PERMANENTLY
    );
}

#[tokio::test]
async fn test_openapi_spec_available() {
    let app = create_router_for_testing();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["openapi"].is_string());
    assert!(json["paths"]["/api/v1/query"].is_object());
    assert!(json["paths"]["/api/v1/properties/transit-routes"].is_object());
}
