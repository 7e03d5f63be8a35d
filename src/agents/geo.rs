//! Geocoding and point-of-interest discovery via the Mapbox APIs
//!
//! Optional collaborator: when no Mapbox token is configured the research
//! stage skips enrichment and listings ship without coordinates or POIs.

use async_trait::async_trait;
use serde::Deserialize;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::agents::error::{AgentError, AgentResult};
use crate::config::GeoSettings;
use crate::domain::Poi;

/// POI categories searched near each geocoded listing
pub const POI_CATEGORIES: [&str; 8] = [
    "school",
    "hospital",
    "grocery",
    "restaurant",
    "park",
    "transit_station",
    "cafe",
    "gym",
];

/// A successfully geocoded address
#[derive(Debug, Clone)]
pub struct GeocodedAddress {
    pub latitude: f64,
    pub longitude: f64,
    /// Canonical address returned by the geocoder
    pub full_address: String,
}

/// Trait for geocoding and nearby-POI lookups
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Forward-geocode a free-text address
    async fn geocode(&self, address: &str) -> AgentResult<GeocodedAddress>;

    /// Find POIs near a coordinate, a couple per category
    async fn nearby_pois(&self, latitude: f64, longitude: f64) -> AgentResult<Vec<Poi>>;
}

/// Mapbox-backed geocoder
pub struct MapboxGeocoder {
    client: reqwest::Client,
    token: String,
    base_url: String,
    pois_per_category: usize,
}

impl MapboxGeocoder {
    /// Create a geocoder when a token is configured; `None` disables
    /// enrichment
    pub fn from_settings(settings: &GeoSettings) -> Option<Arc<dyn Geocoder>> {
        let token = env::var(&settings.api_key_env).ok()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .ok()?;

        Some(Arc::new(Self {
            client,
            token,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            pois_per_category: settings.pois_per_category,
        }))
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn geocode(&self, address: &str) -> AgentResult<GeocodedAddress> {
        let url = format!("{}/search/geocode/v6/forward", self.base_url);
        let response = self
            .client
            .get(url)
            .query(&[
                ("q", address),
                ("access_token", self.token.as_str()),
                ("limit", "1"),
                ("country", "US"),
            ])
            .send()
            .await
            .map_err(|e| AgentError::Geocode(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::Geocode(format!(
                "Mapbox returned {}: {}",
                status, text
            )));
        }

        let parsed: FeatureCollection = response
            .json()
            .await
            .map_err(|e| AgentError::Geocode(format!("Bad geocode response: {}", e)))?;

        let feature = parsed
            .features
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Geocode(format!("No match for '{}'", address)))?;

        // GeoJSON coordinates are [longitude, latitude]
        let [longitude, latitude] = feature.geometry.coordinates();
        Ok(GeocodedAddress {
            latitude,
            longitude,
            full_address: feature
                .properties
                .full_address
                .unwrap_or_else(|| address.to_string()),
        })
    }

    async fn nearby_pois(&self, latitude: f64, longitude: f64) -> AgentResult<Vec<Poi>> {
        let mut pois = Vec::new();
        let proximity = format!("{},{}", longitude, latitude);
        let limit = self.pois_per_category.to_string();

        for category in POI_CATEGORIES {
            let url = format!("{}/search/searchbox/v1/category/{}", self.base_url, category);
            let response = match self
                .client
                .get(url)
                .query(&[
                    ("access_token", self.token.as_str()),
                    ("proximity", proximity.as_str()),
                    ("limit", limit.as_str()),
                    ("language", "en"),
                ])
                .send()
                .await
            {
                Ok(r) if r.status().is_success() => r,
                // One failing category should not sink the whole lookup
                Ok(_) | Err(_) => continue,
            };

            let Ok(parsed) = response.json::<FeatureCollection>().await else {
                continue;
            };

            for feature in parsed.features {
                let [longitude, latitude] = feature.geometry.coordinates();
                pois.push(Poi {
                    name: feature
                        .properties
                        .name
                        .unwrap_or_else(|| "Unknown".to_string()),
                    category: category.to_string(),
                    latitude,
                    longitude,
                    address: feature
                        .properties
                        .full_address
                        .or(feature.properties.place_formatted),
                    distance_meters: feature.properties.distance.map(|d| d as u32),
                });
            }
        }

        Ok(pois)
    }
}

// Mapbox GeoJSON response types, shared by both endpoints

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
    #[serde(default)]
    properties: FeatureProperties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<f64>,
}

impl Geometry {
    /// `[longitude, latitude]`, zero-filled when the payload is short
    fn coordinates(&self) -> [f64; 2] {
        [
            self.coordinates.first().copied().unwrap_or_default(),
            self.coordinates.get(1).copied().unwrap_or_default(),
        ]
    }
}

#[derive(Debug, Default, Deserialize)]
struct FeatureProperties {
    name: Option<String>,
    full_address: Option<String>,
    place_formatted: Option<String>,
    distance: Option<f64>,
}
