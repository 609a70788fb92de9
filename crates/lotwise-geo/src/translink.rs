//! TransLink Open API client
//!
//! Queries the RTTI stops endpoint for live stop data around a point. Used
//! as a fallback when the seeded transit table has no stop near a property.

use crate::{LiveStop, TransitFeed};
use async_trait::async_trait;
use lotwise_core::{CoreError, ExternalConfig, GeoPoint, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const STOPS_URL: &str = "https://api.translink.ca/rttiapi/v1/stops";

pub struct TransLinkClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// Stop record as returned by the RTTI API. Routes arrive as a single
/// comma-separated string.
#[derive(Debug, Deserialize)]
struct StopRecord {
    #[serde(rename = "StopNo")]
    stop_no: u32,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
    #[serde(rename = "Routes", default)]
    routes: String,
}

impl TransLinkClient {
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CoreError::ExternalApiError(format!("HTTP client init failed: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: STOPS_URL.to_string(),
        })
    }

    /// Create from config; `None` when no API key is configured.
    pub fn from_config(config: &ExternalConfig) -> Result<Option<Self>> {
        match &config.translink_api_key {
            Some(key) => Ok(Some(Self::new(key, config.timeout_secs)?)),
            None => Ok(None),
        }
    }

    /// Set custom base URL (for tests against a stub server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn parse_routes(routes: &str) -> Vec<String> {
        routes
            .split(',')
            .map(|r| r.trim().trim_start_matches('0').to_string())
            .filter(|r| !r.is_empty())
            .collect()
    }
}

#[async_trait]
impl TransitFeed for TransLinkClient {
    async fn stops_near(&self, point: GeoPoint, radius_m: u32) -> Result<Vec<LiveStop>> {
        // The API caps the radius at 2000 m.
        let radius = radius_m.min(2000);

        let response = match self
            .client
            .get(&self.base_url)
            .header("Accept", "application/json")
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("lat", &format!("{:.5}", point.lat)),
                ("long", &format!("{:.5}", point.lng)),
                ("radius", &radius.to_string()),
            ])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "translink request failed");
                return Ok(Vec::new());
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "translink request rejected");
            return Ok(Vec::new());
        }

        let records: Vec<StopRecord> = match response.json().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "translink response malformed");
                return Ok(Vec::new());
            }
        };

        let mut stops: Vec<LiveStop> = records
            .into_iter()
            .map(|r| {
                let location = GeoPoint::new(r.latitude, r.longitude);
                LiveStop {
                    stop_code: r.stop_no.to_string(),
                    name: r.name,
                    routes: Self::parse_routes(&r.routes),
                    distance_m: point.distance_m(&location),
                    location,
                }
            })
            .collect();

        // Nearest first; stop_code breaks distance ties deterministically.
        stops.sort_by(|a, b| {
            a.distance_m
                .partial_cmp(&b.distance_m)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.stop_code.cmp(&b.stop_code))
        });

        Ok(stops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_record_parsing() {
        let json = r#"[{
            "StopNo": 50001,
            "Name": "BROADWAY-CITY HALL STN",
            "Latitude": 49.2632,
            "Longitude": -123.1157,
            "Routes": "099, 009"
        }]"#;

        let records: Vec<StopRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stop_no, 50001);
    }

    #[test]
    fn test_route_string_normalization() {
        let routes = TransLinkClient::parse_routes("099, 009, 250");
        assert_eq!(routes, vec!["99", "9", "250"]);

        assert!(TransLinkClient::parse_routes("").is_empty());
    }
}
