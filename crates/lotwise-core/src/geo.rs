//! Geographic point math
//!
//! One distance metric is used everywhere: haversine great-circle distance
//! on WGS84, in meters. PostGIS computes geodesic distance for `geography`
//! columns; this module covers coordinates that arrive from external APIs.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (WGS84).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Average walking speed in meters per minute.
const WALKING_SPEED_M_PER_MIN: f64 = 80.0;

/// Estimated walking time for a distance in meters, in whole minutes.
/// Used to annotate amenity results.
pub fn walking_minutes(distance_m: f64) -> u32 {
    (distance_m / WALKING_SPEED_M_PER_MIN) as u32
}

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Haversine great-circle distance to another point, in meters.
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_M * c
    }
}
