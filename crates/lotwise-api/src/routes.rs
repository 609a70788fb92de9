//! API route definitions

use crate::auth::middleware::auth_middleware;
use crate::handlers::{auth, property, query};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

/// Create API v1 routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        // Unified query endpoint
        .route("/query", post(query::query_handler))
        // Typed property endpoints
        .route("/properties/assessment", get(property::assessment_handler))
        .route("/properties/lot", get(property::lot_handler))
        .route("/properties/zoning", get(property::zoning_handler))
        .route("/properties/schools", get(property::schools_handler))
        .route("/properties/catchment", get(property::catchment_handler))
        .route("/properties/transit", get(property::transit_handler))
        .route(
            "/properties/demographics",
            get(property::demographics_handler),
        )
        .route("/properties/amenities", get(property::amenities_handler))
        .route(
            "/properties/assessment-average",
            get(property::assessment_average_handler),
        )
        .route(
            "/properties/transit-routes",
            get(property::transit_routes_handler),
        )
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
