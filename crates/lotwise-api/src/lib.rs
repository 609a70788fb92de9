//! Lotwise API - REST server
//!
//! HTTP endpoints for property lookups around a civic address: assessment,
//! zoning, schools, transit, demographics, and amenities, behind JWT auth.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use state::AppState;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::auth::register_handler,
        handlers::auth::login_handler,
        handlers::auth::logout_handler,
        handlers::auth::me_handler,
        handlers::query::query_handler,
        handlers::property::assessment_handler,
        handlers::property::lot_handler,
        handlers::property::zoning_handler,
        handlers::property::schools_handler,
        handlers::property::catchment_handler,
        handlers::property::transit_handler,
        handlers::property::demographics_handler,
        handlers::property::amenities_handler,
        handlers::property::assessment_average_handler,
        handlers::property::transit_routes_handler,
    ),
    components(schemas(
        error::ApiError,
        auth::RegisterRequest,
        auth::LoginRequest,
        auth::AuthResponse,
        auth::UserInfo,
        handlers::auth::RegisterResponse,
        handlers::auth::LogoutResponse,
        handlers::query::QueryRequest,
        handlers::query::QueryResponse,
        handlers::query::PropertySummary,
        lotwise_queries::payloads::QueryPayload,
        lotwise_queries::payloads::AssessmentInfo,
        lotwise_queries::payloads::LotInfo,
        lotwise_queries::payloads::ZoningInfo,
        lotwise_queries::payloads::NearbySchool,
        lotwise_queries::payloads::CatchmentInfo,
        lotwise_queries::payloads::TransitStopInfo,
        lotwise_queries::payloads::DemographicsInfo,
        lotwise_queries::payloads::AmenityInfo,
        lotwise_queries::payloads::AmenitiesInfo,
        lotwise_queries::payloads::NeighbourhoodAssessmentInfo,
        lotwise_queries::payloads::TransitRoutesInfo,
    )),
    tags(
        (name = "health", description = "Liveness and readiness probes"),
        (name = "auth", description = "Registration, login, and sessions"),
        (name = "query", description = "Free-text and structured property queries"),
        (name = "properties", description = "Typed per-kind property endpoints"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Build the full application router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Router over a lazy, never-connected pool, for integration tests that
/// exercise routing and auth behavior without a database.
#[cfg(feature = "test-utils")]
pub fn create_router_for_testing() -> Router {
    let state = AppState::for_testing(lotwise_core::AppConfig::default());
    create_router(state)
}
