//! PostgreSQL/PostGIS property store
//!
//! All spatial columns are `geography`, so `ST_Distance`/`ST_DWithin`
//! return geodesic meters. Property points bind as (lng, lat) pairs through
//! `ST_MakePoint`.

use lotwise_core::{CoreError, GeoPoint, Property, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;

use crate::payloads::{
    AmenityInfo, AssessmentInfo, CatchmentInfo, DemographicsInfo, NearbySchool,
    NeighbourhoodAssessmentInfo, TransitStopInfo, ZoningInfo,
};

/// PostgreSQL property store
#[derive(Clone)]
pub struct PropertyStore {
    pool: PgPool,
}

impl PropertyStore {
    /// Create a new store connection
    pub async fn new(database_url: &str, pool_size: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .connect(database_url)
            .await
            .map_err(|e| CoreError::DatabaseError(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Property row from database
#[derive(Debug, FromRow)]
struct PropertyRow {
    id: i64,
    address: String,
    city: String,
    postal_code: Option<String>,
    property_type: Option<String>,
    year_built: Option<i32>,
    lot_size_sqft: Option<i32>,
    lat: f64,
    lng: f64,
}

impl From<PropertyRow> for Property {
    fn from(row: PropertyRow) -> Self {
        Property {
            id: row.id,
            address: row.address,
            city: row.city,
            postal_code: row.postal_code,
            property_type: row.property_type,
            year_built: row.year_built,
            lot_size_sqft: row.lot_size_sqft,
            location: GeoPoint::new(row.lat, row.lng),
        }
    }
}

#[derive(Debug, FromRow)]
struct AssessmentRow {
    assessment_year: i32,
    land_value: i64,
    improvement_value: i64,
    total_value: i64,
}

#[derive(Debug, FromRow)]
struct SchoolRow {
    name: String,
    address: String,
    kind: String,
    district: Option<String>,
    distance_m: f64,
}

#[derive(Debug, FromRow)]
struct StopRow {
    stop_code: String,
    name: String,
    kind: String,
    routes: Vec<String>,
    distance_m: f64,
}

#[derive(Debug, FromRow)]
struct AmenityRow {
    name: String,
    kind: String,
    address: Option<String>,
    rating: Option<f64>,
    distance_m: f64,
}

const PROPERTY_COLUMNS: &str = "id, address, city, postal_code, property_type, year_built, \
     lot_size_sqft, ST_Y(location::geometry) AS lat, ST_X(location::geometry) AS lng";

impl PropertyStore {
    fn db_err(e: sqlx::Error, what: &str) -> CoreError {
        CoreError::DatabaseError(format!("Failed to {what}: {e}"))
    }

    /// Exact (case-insensitive) address match.
    pub async fn property_by_address(&self, address: &str) -> Result<Option<Property>> {
        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE lower(address) = lower($1)"
        ))
        .bind(address)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::db_err(e, "fetch property by address"))?;

        Ok(row.map(Property::from))
    }

    /// Substring match, shortest (most specific) address first.
    pub async fn property_by_address_fuzzy(&self, address: &str) -> Result<Option<Property>> {
        let pattern = format!("%{}%", address.trim());

        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties WHERE address ILIKE $1 \
             ORDER BY length(address), id LIMIT 1"
        ))
        .bind(&pattern)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::db_err(e, "fuzzy-match property"))?;

        Ok(row.map(Property::from))
    }

    /// Nearest property within `max_m` of a point; used after geocoding.
    pub async fn nearest_property(&self, point: GeoPoint, max_m: f64) -> Result<Option<Property>> {
        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties \
             WHERE ST_DWithin(location, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3) \
             ORDER BY ST_Distance(location, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography), id \
             LIMIT 1"
        ))
        .bind(point.lng)
        .bind(point.lat)
        .bind(max_m)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::db_err(e, "find nearest property"))?;

        Ok(row.map(Property::from))
    }

    /// Latest assessment row (max year) for a property.
    pub async fn latest_assessment(&self, property: &Property) -> Result<Option<AssessmentInfo>> {
        let row = sqlx::query_as::<_, AssessmentRow>(
            "SELECT assessment_year, land_value, improvement_value, total_value \
             FROM assessments WHERE property_id = $1 \
             ORDER BY assessment_year DESC LIMIT 1",
        )
        .bind(property.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::db_err(e, "fetch assessment"))?;

        Ok(row.map(|r| AssessmentInfo {
            property_address: property.address.clone(),
            assessment_year: r.assessment_year,
            land_value: r.land_value,
            improvement_value: r.improvement_value,
            total_value: r.total_value,
        }))
    }

    /// Zoning district joined through the property_zoning link table.
    pub async fn zoning_for(&self, property_id: i64) -> Result<Option<ZoningInfo>> {
        let row = sqlx::query_as::<_, ZoningInfo>(
            "SELECT z.zone_code, z.zone_name, z.zone_type, z.description, z.permitted_uses \
             FROM property_zoning pz \
             JOIN zoning_districts z ON z.zone_code = pz.zone_code \
             WHERE pz.property_id = $1 \
             ORDER BY z.zone_code LIMIT 1",
        )
        .bind(property_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::db_err(e, "fetch zoning"))?;

        Ok(row)
    }

    /// Schools within `radius_m`, nearest first. Empty is a valid result.
    pub async fn schools_within(&self, point: GeoPoint, radius_m: f64) -> Result<Vec<NearbySchool>> {
        let rows = sqlx::query_as::<_, SchoolRow>(
            "SELECT name, address, kind, district, \
                    ST_Distance(location, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography) AS distance_m \
             FROM schools \
             WHERE ST_DWithin(location, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3) \
             ORDER BY distance_m, id",
        )
        .bind(point.lng)
        .bind(point.lat)
        .bind(radius_m)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Self::db_err(e, "fetch nearby schools"))?;

        Ok(rows
            .into_iter()
            .map(|r| NearbySchool {
                name: r.name,
                address: r.address,
                kind: r.kind,
                district: r.district,
                distance_m: r.distance_m,
            })
            .collect())
    }

    /// Catchment polygon containing the point.
    pub async fn catchment_containing(&self, point: GeoPoint) -> Result<Option<CatchmentInfo>> {
        let row = sqlx::query_as::<_, CatchmentInfo>(
            "SELECT c.name AS catchment_name, s.name AS school_name, s.kind AS school_kind, \
                    s.address AS school_address, s.district \
             FROM school_catchments c \
             JOIN schools s ON s.id = c.school_id \
             WHERE ST_Covers(c.boundary, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography) \
             ORDER BY c.id LIMIT 1",
        )
        .bind(point.lng)
        .bind(point.lat)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::db_err(e, "fetch catchment"))?;

        Ok(row)
    }

    /// Minimum-distance stop within `radius_m`; ties break on stop_code
    /// ascending so repeated calls return the same stop.
    pub async fn nearest_stop(
        &self,
        point: GeoPoint,
        radius_m: f64,
    ) -> Result<Option<TransitStopInfo>> {
        let row = sqlx::query_as::<_, StopRow>(
            "SELECT stop_code, name, kind, routes, \
                    ST_Distance(location, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography) AS distance_m \
             FROM transit_stops \
             WHERE ST_DWithin(location, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3) \
             ORDER BY distance_m, stop_code \
             LIMIT 1",
        )
        .bind(point.lng)
        .bind(point.lat)
        .bind(radius_m)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::db_err(e, "fetch nearest stop"))?;

        Ok(row.map(|r| TransitStopInfo {
            stop_code: r.stop_code,
            name: r.name,
            kind: r.kind,
            routes: r.routes,
            distance_m: r.distance_m,
            source: "local".to_string(),
        }))
    }

    /// Demographic profile of the neighbourhood polygon containing the point.
    pub async fn neighbourhood_containing(
        &self,
        point: GeoPoint,
    ) -> Result<Option<DemographicsInfo>> {
        let row = sqlx::query_as::<_, DemographicsInfo>(
            "SELECT name AS neighbourhood, city, population, median_income, median_age, education \
             FROM neighbourhoods \
             WHERE ST_Covers(boundary, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography) \
             ORDER BY id LIMIT 1",
        )
        .bind(point.lng)
        .bind(point.lat)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::db_err(e, "fetch demographics"))?;

        Ok(row)
    }

    /// Parks and community centres within `radius_m`, nearest first.
    pub async fn amenities_within(&self, point: GeoPoint, radius_m: f64) -> Result<Vec<AmenityInfo>> {
        let rows = sqlx::query_as::<_, AmenityRow>(
            "SELECT name, kind, address, rating, \
                    ST_Distance(location, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography) AS distance_m \
             FROM amenities \
             WHERE ST_DWithin(location, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3) \
             ORDER BY distance_m, id",
        )
        .bind(point.lng)
        .bind(point.lat)
        .bind(radius_m)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Self::db_err(e, "fetch amenities"))?;

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, r)| AmenityInfo {
                rank: i as u32 + 1,
                name: r.name,
                kind: r.kind,
                address: r.address,
                rating: r.rating,
                walking_time_min: lotwise_core::geo::walking_minutes(r.distance_m),
                distance_m: r.distance_m,
            })
            .collect())
    }

    /// Mean of latest assessment totals over properties inside the same
    /// neighbourhood polygon as the point.
    pub async fn neighbourhood_average_assessment(
        &self,
        point: GeoPoint,
    ) -> Result<Option<NeighbourhoodAssessmentInfo>> {
        let row = sqlx::query_as::<_, NeighbourhoodAssessmentInfo>(
            "SELECT n.name AS neighbourhood, n.city, \
                    AVG(a.total_value)::float8 AS average_total_value, \
                    COUNT(*) AS property_count \
             FROM neighbourhoods n \
             JOIN properties p ON ST_Covers(n.boundary, p.location) \
             JOIN LATERAL ( \
                 SELECT total_value FROM assessments \
                 WHERE property_id = p.id \
                 ORDER BY assessment_year DESC LIMIT 1 \
             ) a ON TRUE \
             WHERE ST_Covers(n.boundary, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography) \
             GROUP BY n.name, n.city \
             LIMIT 1",
        )
        .bind(point.lng)
        .bind(point.lat)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Self::db_err(e, "compute neighbourhood average"))?;

        Ok(row)
    }

    /// Distinct routes serving stops within `radius_m` of a point. Used for
    /// the downtown anchor set.
    pub async fn routes_near(&self, point: GeoPoint, radius_m: f64) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT unnest(routes) AS route FROM transit_stops \
             WHERE ST_DWithin(location, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3) \
             ORDER BY route",
        )
        .bind(point.lng)
        .bind(point.lat)
        .bind(radius_m)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Self::db_err(e, "fetch downtown routes"))?;

        Ok(rows.into_iter().map(|(r,)| r).collect())
    }
}
