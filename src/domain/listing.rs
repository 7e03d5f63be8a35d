//! Property listing and point-of-interest types

use serde::{Deserialize, Serialize};

/// A single property listing surfaced by the research stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyListing {
    /// Street address, or the listing title when no address was extracted
    pub address: String,
    /// City the listing is in
    pub city: String,
    /// Asking price in whole dollars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqft: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Source listing URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Representative image scraped from the listing page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Points of interest near the listing, filled during enrichment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pois: Vec<Poi>,
}

impl PropertyListing {
    /// Minimal listing carrying only what a raw search result provides
    pub fn from_search_hit(title: impl Into<String>, city: impl Into<String>, url: Option<String>) -> Self {
        Self {
            address: title.into(),
            city: city.into(),
            price: None,
            bedrooms: None,
            bathrooms: None,
            sqft: None,
            latitude: None,
            longitude: None,
            description: None,
            url,
            image_url: None,
            pois: Vec::new(),
        }
    }
}

/// Point of interest near a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poi {
    pub name: String,
    /// Search category the POI came from (school, grocery, transit, ...)
    pub category: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<u32>,
}

/// Coordinates of the best-matching listing, used by the map panel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopResultCoordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
