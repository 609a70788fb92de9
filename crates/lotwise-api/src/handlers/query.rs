//! Natural-language and structured query handler
//!
//! One endpoint accepts either a free-text `question` (routed through the
//! configured parser) or an explicit `kind` + `address` pair, resolves the
//! address to a stored property, and dispatches the query.

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use lotwise_core::{Property, QueryKind};
use lotwise_queries::QueryPayload;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Query request body
///
/// Exactly one of `question` or (`kind`, `address`) must be supplied.
#[derive(Debug, Deserialize, ToSchema)]
pub struct QueryRequest {
    /// Free-text question, e.g. "What schools are near 4510 Main St?"
    #[schema(example = "What is the assessed value of 4510 Main St?")]
    pub question: Option<String>,

    /// Explicit query kind, bypassing the parser
    #[schema(value_type = Option<String>, example = "assessment")]
    pub kind: Option<QueryKind>,

    /// Address to resolve when `kind` is given
    #[schema(example = "4510 Main St")]
    pub address: Option<String>,
}

/// Resolved property echoed back with every answer
#[derive(Debug, Serialize, ToSchema)]
pub struct PropertySummary {
    pub id: i64,
    pub address: String,
    pub city: String,
    pub postal_code: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

impl From<&Property> for PropertySummary {
    fn from(p: &Property) -> Self {
        Self {
            id: p.id,
            address: p.address.clone(),
            city: p.city.clone(),
            postal_code: p.postal_code.clone(),
            lat: p.location.lat,
            lng: p.location.lng,
        }
    }
}

/// Query response body
#[derive(Debug, Serialize, ToSchema)]
pub struct QueryResponse {
    /// The query kind that was answered
    #[schema(value_type = String, example = "assessment")]
    pub kind: QueryKind,

    /// The property the answer is about
    pub property: PropertySummary,

    /// Typed answer payload
    pub payload: QueryPayload,

    /// Processing time in milliseconds
    #[schema(example = 42)]
    pub processing_time_ms: u64,
}

/// Handle property queries
#[utoipa::path(
    post,
    path = "/api/v1/query",
    tag = "query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Query successful", body = QueryResponse),
        (status = 400, description = "Invalid or unsupported question", body = crate::error::ApiError),
        (status = 404, description = "Address did not resolve to a property", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 500, description = "Internal error", body = crate::error::ApiError)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn query_handler(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let start = std::time::Instant::now();

    let (kind, address) = match (req.question, req.kind, req.address) {
        (Some(question), None, None) => {
            if question.trim().is_empty() {
                return Err(AppError::BadRequest("Question cannot be empty".to_string()));
            }
            let parsed = state.parser.parse(&question).await?;
            (parsed.kind, parsed.address)
        }
        (None, Some(kind), Some(address)) => (kind, address),
        _ => {
            return Err(AppError::BadRequest(
                "Provide either 'question' or both 'kind' and 'address'".to_string(),
            ));
        }
    };

    let property = state.resolver.resolve(&address).await?;
    let payload = state.router.dispatch(kind, &property).await?;

    tracing::info!(
        kind = kind.as_str(),
        property_id = property.id,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "answered query"
    );

    let response = QueryResponse {
        kind,
        property: PropertySummary::from(&property),
        payload,
        processing_time_ms: start.elapsed().as_millis() as u64,
    };

    Ok((StatusCode::OK, Json(response)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_request_deserializes() {
        let req: QueryRequest = serde_json::from_str(
            r#"{"kind": "nearby_schools", "address": "4510 Main St"}"#,
        )
        .unwrap();

        assert!(req.question.is_none());
        assert_eq!(req.kind, Some(QueryKind::NearbySchools));
        assert_eq!(req.address.as_deref(), Some("4510 Main St"));
    }

    #[test]
    fn test_free_text_request_deserializes() {
        let req: QueryRequest =
            serde_json::from_str(r#"{"question": "Is 123 Oak St in an RS-1 zone?"}"#).unwrap();

        assert!(req.kind.is_none());
        assert!(req.address.is_none());
        assert!(req.question.unwrap().contains("Oak St"));
    }
}
