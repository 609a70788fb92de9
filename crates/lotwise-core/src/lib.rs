//! Lotwise Core - Domain models, configuration, and shared types
//!
//! This crate defines the abstractions used throughout the Lotwise system:
//! - Property, assessment, and neighbourhood models
//! - The fixed set of supported query kinds
//! - Geographic point math (haversine great-circle distance)
//! - Common error types
//! - Configuration management

pub mod config;
pub mod geo;

pub use config::{AppConfig, AuthConfig, ConfigError, DatabaseConfig, ExternalConfig, LlmConfig};
pub use geo::GeoPoint;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for Lotwise operations
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    #[error("Address could not be resolved: {0}")]
    UnresolvableAddress(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================================================
// Query Kinds
// ============================================================================

/// The ten fixed question kinds the query router answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Latest assessment values for the property
    Assessment,
    /// Lot size, year built, and property type
    LotInfo,
    /// Zoning district for the property
    Zoning,
    /// Schools within 1 km, nearest first
    NearbySchools,
    /// Catchment polygon containing the property
    SchoolCatchment,
    /// Minimum-distance transit stop
    NearestTransit,
    /// Demographic profile of the containing neighbourhood
    Demographics,
    /// Parks and community centres within walking distance
    NearbyAmenities,
    /// Mean assessed value across the neighbourhood
    NeighbourhoodAssessment,
    /// Transit routes connecting to downtown
    TransitRoutesDowntown,
}

impl QueryKind {
    /// All kinds in dispatch order.
    pub const ALL: [QueryKind; 10] = [
        QueryKind::Assessment,
        QueryKind::LotInfo,
        QueryKind::Zoning,
        QueryKind::NearbySchools,
        QueryKind::SchoolCatchment,
        QueryKind::NearestTransit,
        QueryKind::Demographics,
        QueryKind::NearbyAmenities,
        QueryKind::NeighbourhoodAssessment,
        QueryKind::TransitRoutesDowntown,
    ];

    /// Stable wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assessment => "assessment",
            Self::LotInfo => "lot_info",
            Self::Zoning => "zoning",
            Self::NearbySchools => "nearby_schools",
            Self::SchoolCatchment => "school_catchment",
            Self::NearestTransit => "nearest_transit",
            Self::Demographics => "demographics",
            Self::NearbyAmenities => "nearby_amenities",
            Self::NeighbourhoodAssessment => "neighbourhood_assessment",
            Self::TransitRoutesDowntown => "transit_routes_downtown",
        }
    }
}

impl std::str::FromStr for QueryKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or_else(|| CoreError::ValidationError(format!("Unknown query kind: {s}")))
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Property Models
// ============================================================================

/// A canonical property row: the origin for every distance-based query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    /// Unique identifier
    pub id: i64,

    /// Full civic address as stored
    pub address: String,

    /// Municipality
    pub city: String,

    /// Canadian postal code
    pub postal_code: Option<String>,

    /// Detached, Townhouse, Condo, ...
    pub property_type: Option<String>,

    /// Construction year
    pub year_built: Option<i32>,

    /// Lot size in square feet
    pub lot_size_sqft: Option<i32>,

    /// Geocoded location (exactly one per property)
    pub location: GeoPoint,
}

/// A yearly assessment for a property. One-to-many per property across years.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub property_id: i64,
    pub assessment_year: i32,
    pub land_value: i64,
    pub improvement_value: i64,
    pub total_value: i64,
}

/// A zoning district designation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoningDistrict {
    pub zone_code: String,
    pub zone_name: String,
    pub zone_type: String,
    pub description: Option<String>,
    pub permitted_uses: Option<String>,
    pub city: String,
}

/// A school with its point location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct School {
    pub id: i64,
    pub name: String,
    pub address: String,
    /// Elementary or Secondary
    pub kind: String,
    pub district: Option<String>,
    pub location: GeoPoint,
}

/// A transit stop. `stop_code` is the stable identifier used for tie-breaks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitStop {
    pub stop_code: String,
    pub name: String,
    /// bus_stop or skytrain_station
    pub kind: String,
    pub routes: Vec<String>,
    pub location: GeoPoint,
}

/// A park or community centre.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Amenity {
    pub id: i64,
    pub name: String,
    /// park or community_centre
    pub kind: String,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub location: GeoPoint,
}

/// Demographic profile of a neighbourhood, joined by spatial containment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeighbourhoodProfile {
    pub name: String,
    pub city: String,
    pub population: i64,
    pub median_income: i64,
    pub median_age: f64,
    /// Education attainment shares, e.g. {"University": 70, "College": 18}
    pub education: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_query_kind_round_trip() {
        for kind in QueryKind::ALL {
            let parsed = QueryKind::from_str(kind.as_str()).unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_query_kind_unknown() {
        let result = QueryKind::from_str("restaurants");
        assert!(matches!(result, Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn test_query_kind_serde_matches_as_str() {
        let json = serde_json::to_string(&QueryKind::NearbySchools).unwrap();
        assert_eq!(json, "\"nearby_schools\"");

        let kind: QueryKind = serde_json::from_str("\"transit_routes_downtown\"").unwrap();
        assert_eq!(kind, QueryKind::TransitRoutesDowntown);
    }
}
