//! Typed property endpoints
//!
//! One endpoint per query kind for clients that don't want to go through
//! the free-text parser. All share the resolve-then-dispatch flow and the
//! response shape of `/api/v1/query`.

use super::query::{PropertySummary, QueryResponse};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use lotwise_core::QueryKind;
use serde::Deserialize;
use utoipa::IntoParams;

/// Address query string, shared by all typed endpoints
#[derive(Debug, Deserialize, IntoParams)]
pub struct AddressQuery {
    /// Street address, postal code, or intersection
    pub address: String,
}

async fn answer(
    state: &AppState,
    kind: QueryKind,
    address: &str,
) -> Result<Json<QueryResponse>, AppError> {
    state.increment_requests();

    let start = std::time::Instant::now();

    let property = state.resolver.resolve(address).await?;
    let payload = state.router.dispatch(kind, &property).await?;

    Ok(Json(QueryResponse {
        kind,
        property: PropertySummary::from(&property),
        payload,
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}

/// Latest assessment for a property
#[utoipa::path(
    get,
    path = "/api/v1/properties/assessment",
    tag = "properties",
    params(AddressQuery),
    responses(
        (status = 200, description = "Latest assessment", body = QueryResponse),
        (status = 404, description = "Address did not resolve", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn assessment_handler(
    State(state): State<AppState>,
    Query(q): Query<AddressQuery>,
) -> Result<impl IntoResponse, AppError> {
    answer(&state, QueryKind::Assessment, &q.address).await
}

/// Lot size, year built, and property type
#[utoipa::path(
    get,
    path = "/api/v1/properties/lot",
    tag = "properties",
    params(AddressQuery),
    responses(
        (status = 200, description = "Lot details", body = QueryResponse),
        (status = 404, description = "Address did not resolve", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn lot_handler(
    State(state): State<AppState>,
    Query(q): Query<AddressQuery>,
) -> Result<impl IntoResponse, AppError> {
    answer(&state, QueryKind::LotInfo, &q.address).await
}

/// Zoning district for a property
#[utoipa::path(
    get,
    path = "/api/v1/properties/zoning",
    tag = "properties",
    params(AddressQuery),
    responses(
        (status = 200, description = "Zoning district", body = QueryResponse),
        (status = 404, description = "Address did not resolve", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn zoning_handler(
    State(state): State<AppState>,
    Query(q): Query<AddressQuery>,
) -> Result<impl IntoResponse, AppError> {
    answer(&state, QueryKind::Zoning, &q.address).await
}

/// Schools within 1 km, nearest first
#[utoipa::path(
    get,
    path = "/api/v1/properties/schools",
    tag = "properties",
    params(AddressQuery),
    responses(
        (status = 200, description = "Nearby schools", body = QueryResponse),
        (status = 404, description = "Address did not resolve", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn schools_handler(
    State(state): State<AppState>,
    Query(q): Query<AddressQuery>,
) -> Result<impl IntoResponse, AppError> {
    answer(&state, QueryKind::NearbySchools, &q.address).await
}

/// School catchment containing the property
#[utoipa::path(
    get,
    path = "/api/v1/properties/catchment",
    tag = "properties",
    params(AddressQuery),
    responses(
        (status = 200, description = "School catchment", body = QueryResponse),
        (status = 404, description = "Address did not resolve", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn catchment_handler(
    State(state): State<AppState>,
    Query(q): Query<AddressQuery>,
) -> Result<impl IntoResponse, AppError> {
    answer(&state, QueryKind::SchoolCatchment, &q.address).await
}

/// Nearest transit stop, with walking time
#[utoipa::path(
    get,
    path = "/api/v1/properties/transit",
    tag = "properties",
    params(AddressQuery),
    responses(
        (status = 200, description = "Nearest transit stop", body = QueryResponse),
        (status = 404, description = "Address did not resolve", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn transit_handler(
    State(state): State<AppState>,
    Query(q): Query<AddressQuery>,
) -> Result<impl IntoResponse, AppError> {
    answer(&state, QueryKind::NearestTransit, &q.address).await
}

/// Demographics of the containing neighbourhood
#[utoipa::path(
    get,
    path = "/api/v1/properties/demographics",
    tag = "properties",
    params(AddressQuery),
    responses(
        (status = 200, description = "Neighbourhood demographics", body = QueryResponse),
        (status = 404, description = "Address did not resolve", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn demographics_handler(
    State(state): State<AppState>,
    Query(q): Query<AddressQuery>,
) -> Result<impl IntoResponse, AppError> {
    answer(&state, QueryKind::Demographics, &q.address).await
}

/// Parks and community centres within walking distance
#[utoipa::path(
    get,
    path = "/api/v1/properties/amenities",
    tag = "properties",
    params(AddressQuery),
    responses(
        (status = 200, description = "Nearby amenities", body = QueryResponse),
        (status = 404, description = "Address did not resolve", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn amenities_handler(
    State(state): State<AppState>,
    Query(q): Query<AddressQuery>,
) -> Result<impl IntoResponse, AppError> {
    answer(&state, QueryKind::NearbyAmenities, &q.address).await
}

/// Average latest assessment across the neighbourhood
#[utoipa::path(
    get,
    path = "/api/v1/properties/assessment-average",
    tag = "properties",
    params(AddressQuery),
    responses(
        (status = 200, description = "Neighbourhood assessment average", body = QueryResponse),
        (status = 404, description = "Address did not resolve", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn assessment_average_handler(
    State(state): State<AppState>,
    Query(q): Query<AddressQuery>,
) -> Result<impl IntoResponse, AppError> {
    answer(&state, QueryKind::NeighbourhoodAssessment, &q.address).await
}

/// Routes from the nearest stop that also serve downtown
#[utoipa::path(
    get,
    path = "/api/v1/properties/transit-routes",
    tag = "properties",
    params(AddressQuery),
    responses(
        (status = 200, description = "Downtown-bound transit routes", body = QueryResponse),
        (status = 404, description = "Address did not resolve", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn transit_routes_handler(
    State(state): State<AppState>,
    Query(q): Query<AddressQuery>,
) -> Result<impl IntoResponse, AppError> {
    answer(&state, QueryKind::TransitRoutesDowntown, &q.address).await
}
