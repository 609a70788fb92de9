//! Lotwise Geo - External geocoding and transit API clients
//!
//! Every client here is an optional collaborator: requests carry an explicit
//! timeout and failures degrade to `Ok(None)` or an empty list so a flaky
//! upstream never fails the whole query.

pub mod google;
pub mod translink;

pub use google::GoogleGeocoder;
pub use translink::TransLinkClient;

use async_trait::async_trait;
use lotwise_core::{GeoPoint, Result};
use serde::{Deserialize, Serialize};

/// A geocoding result for a free-text address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodedAddress {
    /// Canonical formatted address returned by the geocoder
    pub formatted_address: String,
    /// Provider place identifier, when available
    pub place_id: Option<String>,
    /// Resolved location
    pub location: GeoPoint,
}

/// Maps free text to a canonical address and point.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve an address. `Ok(None)` means the provider had no match or
    /// was unreachable; callers treat both the same way.
    async fn geocode(&self, address: &str) -> Result<Option<GeocodedAddress>>;
}

/// A transit stop reported by a live feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveStop {
    /// Stable stop identifier (tie-break key)
    pub stop_code: String,
    pub name: String,
    pub routes: Vec<String>,
    pub location: GeoPoint,
    /// Distance from the queried point, in meters
    pub distance_m: f64,
}

/// Live transit data source, used when the local dataset has no answer.
#[async_trait]
pub trait TransitFeed: Send + Sync {
    /// Stops within `radius_m` of a point, nearest first. Empty on failure.
    async fn stops_near(&self, point: GeoPoint, radius_m: u32) -> Result<Vec<LiveStop>>;
}

/// A no-op feed for deployments without a TransLink key and for tests.
pub struct NullTransitFeed;

#[async_trait]
impl TransitFeed for NullTransitFeed {
    async fn stops_near(&self, _point: GeoPoint, _radius_m: u32) -> Result<Vec<LiveStop>> {
        Ok(Vec::new())
    }
}

/// A no-op geocoder for deployments without a Google key and for tests.
pub struct NullGeocoder;

#[async_trait]
impl Geocoder for NullGeocoder {
    async fn geocode(&self, _address: &str) -> Result<Option<GeocodedAddress>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_geocoder_resolves_nothing() {
        let geocoder = NullGeocoder;
        let result = geocoder.geocode("2458 Ottawa Ave").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_null_transit_feed_is_empty() {
        let feed = NullTransitFeed;
        let stops = feed
            .stops_near(GeoPoint::new(49.28, -123.12), 500)
            .await
            .unwrap();
        assert!(stops.is_empty());
    }
}
