//! Address resolution
//!
//! Maps free text to the canonical property row: exact match, then fuzzy
//! substring match, then geocoding plus nearest-parcel lookup. The geocoder
//! is optional; without one, unmatched addresses are simply unresolvable.

use crate::store::PropertyStore;
use lotwise_core::{CoreError, Property, Result};
use lotwise_geo::Geocoder;
use std::sync::Arc;

/// How far (meters) a geocoded point may sit from a stored parcel and
/// still resolve to it.
const GEOCODE_SNAP_RADIUS_M: f64 = 100.0;

#[derive(Clone)]
pub struct AddressResolver {
    store: PropertyStore,
    geocoder: Option<Arc<dyn Geocoder>>,
}

impl AddressResolver {
    pub fn new(store: PropertyStore, geocoder: Option<Arc<dyn Geocoder>>) -> Self {
        Self { store, geocoder }
    }

    /// Resolve free text to a canonical property.
    ///
    /// Fails with `UnresolvableAddress` when nothing matches and geocoding
    /// produced no usable point, and with `PropertyNotFound` when geocoding
    /// succeeded but no stored parcel sits near the point.
    pub async fn resolve(&self, address: &str) -> Result<Property> {
        let address = address.trim();
        if address.is_empty() {
            return Err(CoreError::ValidationError("Address is empty".to_string()));
        }

        if let Some(property) = self.store.property_by_address(address).await? {
            return Ok(property);
        }

        if let Some(property) = self.store.property_by_address_fuzzy(address).await? {
            tracing::debug!(input = address, matched = %property.address, "fuzzy address match");
            return Ok(property);
        }

        let Some(geocoder) = &self.geocoder else {
            return Err(CoreError::UnresolvableAddress(address.to_string()));
        };

        let Some(geocoded) = geocoder.geocode(address).await? else {
            return Err(CoreError::UnresolvableAddress(address.to_string()));
        };

        tracing::debug!(
            input = address,
            formatted = %geocoded.formatted_address,
            "geocoded unmatched address"
        );

        self.store
            .nearest_property(geocoded.location, GEOCODE_SNAP_RADIUS_M)
            .await?
            .ok_or_else(|| CoreError::PropertyNotFound(geocoded.formatted_address))
    }
}
