//! Geospatial query router
//!
//! One operation per query kind plus a dispatch-by-kind entry point. Every
//! operation takes a resolved property and returns a typed payload; empty
//! spatial joins come back as empty collections, not errors.

use crate::payloads::{
    AmenitiesInfo, LotInfo, QueryPayload, TransitRoutesInfo, TransitStopInfo,
};
use crate::store::PropertyStore;
use lotwise_core::{GeoPoint, Property, QueryKind, Result};
use lotwise_geo::TransitFeed;
use std::sync::Arc;

/// Search radius for nearby schools, in meters.
const SCHOOL_RADIUS_M: f64 = 1_000.0;

/// Walking-distance radius for amenities, in meters.
const AMENITY_RADIUS_M: f64 = 1_000.0;

/// How many amenities to return, nearest first.
const AMENITY_LIMIT: usize = 5;

/// Search radius for the nearest transit stop before falling back to the
/// live feed, in meters.
const TRANSIT_RADIUS_M: f64 = 2_000.0;

/// Waterfront Station: the hub every downtown-bound route reaches.
const DOWNTOWN_ANCHOR: GeoPoint = GeoPoint {
    lat: 49.2857,
    lng: -123.1116,
};
const DOWNTOWN_ANCHOR_NAME: &str = "Waterfront Station";

/// Stops within this distance of the anchor count as downtown stops.
const DOWNTOWN_RADIUS_M: f64 = 500.0;

#[derive(Clone)]
pub struct QueryRouter {
    store: PropertyStore,
    transit: Arc<dyn TransitFeed>,
}

impl QueryRouter {
    pub fn new(store: PropertyStore, transit: Arc<dyn TransitFeed>) -> Self {
        Self { store, transit }
    }

    /// Dispatch a query kind against a resolved property.
    pub async fn dispatch(&self, kind: QueryKind, property: &Property) -> Result<QueryPayload> {
        let payload = match kind {
            QueryKind::Assessment => {
                QueryPayload::Assessment(self.store.latest_assessment(property).await?)
            }
            QueryKind::LotInfo => QueryPayload::LotInfo(self.lot_info(property)),
            QueryKind::Zoning => QueryPayload::Zoning(self.store.zoning_for(property.id).await?),
            QueryKind::NearbySchools => QueryPayload::NearbySchools(
                self.store
                    .schools_within(property.location, SCHOOL_RADIUS_M)
                    .await?,
            ),
            QueryKind::SchoolCatchment => QueryPayload::SchoolCatchment(
                self.store.catchment_containing(property.location).await?,
            ),
            QueryKind::NearestTransit => {
                QueryPayload::NearestTransit(self.nearest_transit(property).await?)
            }
            QueryKind::Demographics => QueryPayload::Demographics(
                self.store.neighbourhood_containing(property.location).await?,
            ),
            QueryKind::NearbyAmenities => {
                QueryPayload::NearbyAmenities(self.nearby_amenities(property).await?)
            }
            QueryKind::NeighbourhoodAssessment => QueryPayload::NeighbourhoodAssessment(
                self.store
                    .neighbourhood_average_assessment(property.location)
                    .await?,
            ),
            QueryKind::TransitRoutesDowntown => {
                QueryPayload::TransitRoutesDowntown(self.transit_routes_downtown(property).await?)
            }
        };

        Ok(payload)
    }

    fn lot_info(&self, property: &Property) -> LotInfo {
        LotInfo {
            address: property.address.clone(),
            property_type: property.property_type.clone(),
            year_built: property.year_built,
            lot_size_sqft: property.lot_size_sqft,
        }
    }

    /// Nearest stop from the local dataset, falling back to the live feed
    /// when the table has nothing in range. A feed failure degrades to
    /// `None` rather than failing the request.
    async fn nearest_transit(&self, property: &Property) -> Result<Option<TransitStopInfo>> {
        if let Some(stop) = self
            .store
            .nearest_stop(property.location, TRANSIT_RADIUS_M)
            .await?
        {
            return Ok(Some(stop));
        }

        let live = self
            .transit
            .stops_near(property.location, TRANSIT_RADIUS_M as u32)
            .await
            .unwrap_or_default();

        Ok(live.into_iter().next().map(|s| TransitStopInfo {
            stop_code: s.stop_code,
            name: s.name,
            kind: "bus_stop".to_string(),
            routes: s.routes,
            distance_m: s.distance_m,
            source: "translink".to_string(),
        }))
    }

    async fn nearby_amenities(&self, property: &Property) -> Result<AmenitiesInfo> {
        let mut results = self
            .store
            .amenities_within(property.location, AMENITY_RADIUS_M)
            .await?;
        results.truncate(AMENITY_LIMIT);

        Ok(AmenitiesInfo {
            radius_m: AMENITY_RADIUS_M as u32,
            results,
        })
    }

    /// Routes shared between the nearest stop and the downtown anchor
    /// stops. Not purely local: the nearest stop itself may come from the
    /// live feed.
    async fn transit_routes_downtown(&self, property: &Property) -> Result<TransitRoutesInfo> {
        let nearest = self.nearest_transit(property).await?;

        let downtown_routes = self
            .store
            .routes_near(DOWNTOWN_ANCHOR, DOWNTOWN_RADIUS_M)
            .await?;

        let routes_to_downtown = match &nearest {
            Some(stop) => stop
                .routes
                .iter()
                .filter(|r| downtown_routes.contains(r))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        Ok(TransitRoutesInfo {
            nearest_stop: nearest,
            routes_to_downtown,
            downtown_anchor: DOWNTOWN_ANCHOR_NAME.to_string(),
        })
    }
}
