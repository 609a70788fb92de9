//! Typed response payloads, one per query kind
//!
//! Spatial lookups that come back empty are valid results: list payloads
//! serialize as empty collections and single-row payloads as `null`, never
//! as errors.

use lotwise_core::QueryKind;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// The payload for a dispatched query, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum QueryPayload {
    Assessment(Option<AssessmentInfo>),
    LotInfo(LotInfo),
    Zoning(Option<ZoningInfo>),
    NearbySchools(Vec<NearbySchool>),
    SchoolCatchment(Option<CatchmentInfo>),
    NearestTransit(Option<TransitStopInfo>),
    Demographics(Option<DemographicsInfo>),
    NearbyAmenities(AmenitiesInfo),
    NeighbourhoodAssessment(Option<NeighbourhoodAssessmentInfo>),
    TransitRoutesDowntown(TransitRoutesInfo),
}

impl QueryPayload {
    /// The kind this payload answers.
    pub fn kind(&self) -> QueryKind {
        match self {
            Self::Assessment(_) => QueryKind::Assessment,
            Self::LotInfo(_) => QueryKind::LotInfo,
            Self::Zoning(_) => QueryKind::Zoning,
            Self::NearbySchools(_) => QueryKind::NearbySchools,
            Self::SchoolCatchment(_) => QueryKind::SchoolCatchment,
            Self::NearestTransit(_) => QueryKind::NearestTransit,
            Self::Demographics(_) => QueryKind::Demographics,
            Self::NearbyAmenities(_) => QueryKind::NearbyAmenities,
            Self::NeighbourhoodAssessment(_) => QueryKind::NeighbourhoodAssessment,
            Self::TransitRoutesDowntown(_) => QueryKind::TransitRoutesDowntown,
        }
    }
}

/// Latest assessment values for a property.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssessmentInfo {
    pub property_address: String,
    pub assessment_year: i32,
    pub land_value: i64,
    pub improvement_value: i64,
    pub total_value: i64,
}

/// Direct property fields.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LotInfo {
    pub address: String,
    pub property_type: Option<String>,
    pub year_built: Option<i32>,
    pub lot_size_sqft: Option<i32>,
}

/// Zoning district for a property.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct ZoningInfo {
    pub zone_code: String,
    pub zone_name: String,
    pub zone_type: String,
    pub description: Option<String>,
    pub permitted_uses: Option<String>,
}

/// A school within the search radius, with geodesic distance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NearbySchool {
    pub name: String,
    pub address: String,
    pub kind: String,
    pub district: Option<String>,
    pub distance_m: f64,
}

/// The catchment polygon containing the property point.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct CatchmentInfo {
    pub catchment_name: String,
    pub school_name: String,
    pub school_kind: String,
    pub school_address: String,
    pub district: Option<String>,
}

/// A transit stop with distance; `source` says whether it came from the
/// local dataset or the live TransLink fallback.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransitStopInfo {
    pub stop_code: String,
    pub name: String,
    pub kind: String,
    pub routes: Vec<String>,
    pub distance_m: f64,
    pub source: String,
}

/// Demographic profile of the containing neighbourhood.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct DemographicsInfo {
    pub neighbourhood: String,
    pub city: String,
    pub population: i64,
    pub median_income: i64,
    pub median_age: f64,
    #[schema(value_type = Object)]
    pub education: serde_json::Value,
}

/// A park or community centre within walking distance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AmenityInfo {
    pub rank: u32,
    pub name: String,
    pub kind: String,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub distance_m: f64,
    pub walking_time_min: u32,
}

/// Walking-distance amenities, nearest first.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AmenitiesInfo {
    pub radius_m: u32,
    pub results: Vec<AmenityInfo>,
}

/// Mean assessed value across properties in the same neighbourhood.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct NeighbourhoodAssessmentInfo {
    pub neighbourhood: String,
    pub city: String,
    pub average_total_value: f64,
    pub property_count: i64,
}

/// Transit routes connecting the property to downtown.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransitRoutesInfo {
    pub nearest_stop: Option<TransitStopInfo>,
    /// Routes serving both the nearest stop and a downtown anchor stop
    pub routes_to_downtown: Vec<String>,
    pub downtown_anchor: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_tag_matches_query_kind() {
        let payload = QueryPayload::NearbySchools(vec![]);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["kind"], payload.kind().as_str());
        assert!(json["data"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_empty_single_row_payload_is_null() {
        let payload = QueryPayload::SchoolCatchment(None);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["kind"], "school_catchment");
        assert!(json["data"].is_null());
    }
}
