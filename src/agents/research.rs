//! Research stage: turn a complete requirements record into property listings
//!
//! Searches listing sites through the search provider (restricted to an
//! allow-list of real-estate domains), coerces the hits into structured
//! listings with an LLM digest, and enriches the top results with
//! coordinates, an image, and nearby POIs when the optional collaborators
//! are configured. Empty or malformed results fall back to a placeholder
//! dataset so the turn always completes with a usable payload.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::agents::geo::Geocoder;
use crate::agents::llm::{parse_json_payload, CompletionRequest, LlmProvider};
use crate::agents::scrape::{extract_first_image, PageScraper};
use crate::agents::search::{SearchHit, SearchProvider, SearchQuery};
use crate::config::ResearchSettings;
use crate::domain::{
    format_price, ChatResult, ChatStreamSender, PropertyListing, Requirements,
    TopResultCoordinates,
};

/// Agent name used in progress events and logs
pub const AGENT_NAME: &str = "research";

const DIGEST_SYSTEM_PROMPT: &str = "\
You are a real estate research assistant. You receive raw web search results \
for a property search and produce structured listings plus a short summary.

RULES:
- Only include listings that match the requirements and location
- Extract price, bedrooms, bathrooms, and sqft when the result text states \
them; use null when it doesn't
- The summary is warm and conversational, mentions 2-3 specific listings, \
and stays under 4 sentences

Respond with only a JSON object in this format:
{
  \"summary\": \"<conversational summary>\",
  \"listings\": [
    {
      \"address\": \"<street address or listing title>\",
      \"city\": \"<city>\",
      \"price\": <number or null>,
      \"bedrooms\": <number or null>,
      \"bathrooms\": <number or null>,
      \"sqft\": <number or null>,
      \"description\": \"<one-line description or null>\",
      \"url\": \"<source url or null>\"
    }
  ]
}";

/// Domains whose listing pages are worth scraping for an image
const SCRAPEABLE_DOMAINS: [&str; 2] = ["redfin.com", "zillow.com"];

/// Structured digest the LLM returns
#[derive(Debug, Deserialize)]
struct Digest {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    listings: Vec<ListingExtract>,
}

#[derive(Debug, Deserialize)]
struct ListingExtract {
    address: String,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    price: Option<u64>,
    #[serde(default)]
    bedrooms: Option<u32>,
    #[serde(default)]
    bathrooms: Option<u32>,
    #[serde(default)]
    sqft: Option<u32>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

pub struct ResearchStage {
    llm: Arc<dyn LlmProvider>,
    search: Arc<dyn SearchProvider>,
    geocoder: Option<Arc<dyn Geocoder>>,
    scraper: Option<Arc<dyn PageScraper>>,
    settings: ResearchSettings,
}

impl ResearchStage {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchProvider>,
        geocoder: Option<Arc<dyn Geocoder>>,
        scraper: Option<Arc<dyn PageScraper>>,
        settings: ResearchSettings,
    ) -> Self {
        Self {
            llm,
            search,
            geocoder,
            scraper,
            settings,
        }
    }

    /// Run the research pipeline for a completed requirements record.
    ///
    /// Never fails: every error path degrades to the placeholder dataset
    /// with a non-empty summary.
    pub async fn run(&self, requirements: &Requirements, progress: &ChatStreamSender) -> ChatResult {
        let query = build_query(requirements);
        info!(agent = AGENT_NAME, query = %query, "searching listings");
        progress
            .progress(AGENT_NAME, format!("Searching listings: {}", query))
            .await;

        let search_query = SearchQuery::new(&query, self.settings.max_results)
            .with_domains(&self.settings.allow_domains);

        let hits = match self.search.search(search_query).await {
            Ok(response) => {
                filter_hits(response.hits, &self.settings.allow_domains, &requirements.location)
            }
            Err(e) => {
                warn!(agent = AGENT_NAME, error = %e, "search failed, using placeholders");
                progress
                    .error(AGENT_NAME, "Listing search is unavailable right now")
                    .await;
                Vec::new()
            }
        };

        if hits.is_empty() {
            return self.placeholder_result(requirements);
        }

        progress
            .progress(AGENT_NAME, format!("Found {} candidate listings", hits.len()))
            .await;

        let total_found = hits.len();
        let (summary, mut properties) = self.digest(requirements, &hits).await;

        if properties.is_empty() {
            return self.placeholder_result(requirements);
        }

        properties.truncate(self.settings.enrich_top);
        let top_result_coordinates = self.enrich(&mut properties, progress).await;

        ChatResult {
            requirements: requirements.clone(),
            properties,
            search_summary: summary,
            total_found,
            top_result_coordinates,
        }
    }

    /// LLM digest of the filtered hits; falls back to a mechanical mapping
    /// plus a deterministic summary when the model misbehaves
    async fn digest(
        &self,
        requirements: &Requirements,
        hits: &[SearchHit],
    ) -> (String, Vec<PropertyListing>) {
        let mut results_text = String::new();
        for (idx, hit) in hits.iter().enumerate() {
            results_text.push_str(&format!("{}. {}\n", idx + 1, hit.title));
            if !hit.content.is_empty() {
                results_text.push_str(&format!("   {}\n", hit.content));
            }
            results_text.push_str(&format!("   Link: {}\n\n", hit.url));
        }

        let prompt = format!(
            "User is looking for: {}\n\nSearch results:\n{}\nProduce the JSON \
             object described in your instructions.",
            requirements.describe(),
            results_text
        );

        let request = CompletionRequest::new(DIGEST_SYSTEM_PROMPT, &prompt).with_temperature(0.3);

        match self.llm.complete(request).await {
            Ok(completion) => match parse_json_payload::<Digest>(&completion.content) {
                Ok(digest) if !digest.listings.is_empty() => {
                    let summary = if digest.summary.trim().is_empty() {
                        fallback_summary(hits.len(), requirements)
                    } else {
                        digest.summary
                    };
                    let listings = digest
                        .listings
                        .into_iter()
                        .map(|l| PropertyListing {
                            address: l.address,
                            city: l.city.unwrap_or_else(|| requirements.location.clone()),
                            price: l.price,
                            bedrooms: l.bedrooms,
                            bathrooms: l.bathrooms,
                            sqft: l.sqft,
                            latitude: None,
                            longitude: None,
                            description: l.description,
                            url: l.url,
                            image_url: None,
                            pois: Vec::new(),
                        })
                        .collect();
                    (summary, listings)
                }
                Ok(_) | Err(_) => {
                    warn!(agent = AGENT_NAME, "unusable digest, mapping raw hits");
                    (
                        fallback_summary(hits.len(), requirements),
                        hits_to_listings(hits, &requirements.location),
                    )
                }
            },
            Err(e) => {
                warn!(agent = AGENT_NAME, error = %e, "digest LLM call failed");
                (
                    fallback_summary(hits.len(), requirements),
                    hits_to_listings(hits, &requirements.location),
                )
            }
        }
    }

    /// Geocode, scrape an image, and attach POIs for the retained listings.
    /// Returns the coordinates of the first listing that geocoded.
    async fn enrich(
        &self,
        properties: &mut [PropertyListing],
        progress: &ChatStreamSender,
    ) -> Option<TopResultCoordinates> {
        if let Some(scraper) = &self.scraper {
            for listing in properties.iter_mut() {
                let Some(url) = listing.url.clone() else {
                    continue;
                };
                if !SCRAPEABLE_DOMAINS.iter().any(|d| url.contains(d)) {
                    continue;
                }
                match scraper.scrape_markdown(&url).await {
                    Ok(markdown) => listing.image_url = extract_first_image(&markdown),
                    Err(e) => {
                        warn!(agent = AGENT_NAME, url = %url, error = %e, "scrape failed");
                    }
                }
            }
        }

        let geocoder = self.geocoder.as_ref()?;
        progress
            .progress(AGENT_NAME, "Locating listings on the map")
            .await;

        let mut top: Option<TopResultCoordinates> = None;
        for listing in properties.iter_mut() {
            let query = if listing.address.contains(&listing.city) {
                listing.address.clone()
            } else {
                format!("{}, {}", listing.address, listing.city)
            };

            let geocoded = match geocoder.geocode(&query).await {
                Ok(g) => g,
                Err(e) => {
                    warn!(agent = AGENT_NAME, address = %query, error = %e, "geocoding failed");
                    continue;
                }
            };

            listing.latitude = Some(geocoded.latitude);
            listing.longitude = Some(geocoded.longitude);

            match geocoder
                .nearby_pois(geocoded.latitude, geocoded.longitude)
                .await
            {
                Ok(pois) => listing.pois = pois,
                Err(e) => {
                    warn!(agent = AGENT_NAME, error = %e, "POI lookup failed");
                }
            }

            if top.is_none() {
                top = Some(TopResultCoordinates {
                    latitude: geocoded.latitude,
                    longitude: geocoded.longitude,
                    address: geocoded.full_address,
                    image_url: listing.image_url.clone(),
                });
            }
        }
        top
    }

    /// Static dataset standing in for live results, so an empty or failed
    /// search still produces a renderable payload
    fn placeholder_result(&self, requirements: &Requirements) -> ChatResult {
        let properties = placeholder_listings(&requirements.location);
        let total_found = properties.len();
        ChatResult {
            requirements: requirements.clone(),
            properties,
            search_summary: format!(
                "I couldn't find live listings matching your search in {} just \
                 now, so here are a few representative homes to give you a \
                 feel for the market. Try again shortly for current results.",
                requirements.location
            ),
            total_found,
            top_result_coordinates: None,
        }
    }
}

/// Natural search query in the shape listing sites index well,
/// e.g. "Oakland 3 bedroom 2 bath homes for sale under $800k"
pub fn build_query(requirements: &Requirements) -> String {
    let mut parts = vec![requirements.location.clone()];
    if let Some(beds) = requirements.bedrooms {
        parts.push(format!("{} bedroom", beds));
    }
    if let Some(baths) = requirements.bathrooms {
        parts.push(format!("{} bath", baths));
    }
    parts.push("homes for sale".to_string());
    if let Some(max) = requirements.budget_max {
        parts.push(format!("under {}", format_price(max)));
    } else if let Some(min) = requirements.budget_min {
        parts.push(format!("over {}", format_price(min)));
    }
    parts.join(" ")
}

/// Drop hits that are not from an allow-listed listing site or that don't
/// mention the requested location
fn filter_hits(hits: Vec<SearchHit>, allow_domains: &[String], location: &str) -> Vec<SearchHit> {
    let location_lower = location.to_lowercase();
    hits.into_iter()
        .filter(|hit| {
            let url_lower = hit.url.to_lowercase();
            if !allow_domains.iter().any(|d| url_lower.contains(d.as_str())) {
                return false;
            }
            hit.title.to_lowercase().contains(&location_lower)
                || hit.content.to_lowercase().contains(&location_lower)
                || url_lower.contains(&location_lower.replace(' ', "-"))
        })
        .collect()
}

fn hits_to_listings(hits: &[SearchHit], location: &str) -> Vec<PropertyListing> {
    hits.iter()
        .map(|hit| {
            let mut listing =
                PropertyListing::from_search_hit(&hit.title, location, Some(hit.url.clone()));
            if !hit.content.is_empty() {
                listing.description = Some(hit.content.clone());
            }
            listing
        })
        .collect()
}

fn fallback_summary(count: usize, requirements: &Requirements) -> String {
    format!(
        "Found {} property listings in {}. Check the search results for details!",
        count, requirements.location
    )
}

/// Sample listings shown when search returns nothing usable
fn placeholder_listings(location: &str) -> Vec<PropertyListing> {
    let city = if location.trim().is_empty() {
        "your area"
    } else {
        location
    };
    [
        ("1420 Harrison St", 749_000_u64, 3_u32, 2_u32, 1_480_u32),
        ("87 Maple Ave", 825_000, 3, 2, 1_620),
        ("2304 Lakeview Dr", 698_000, 2, 1, 1_150),
    ]
    .into_iter()
    .map(|(address, price, beds, baths, sqft)| PropertyListing {
        address: address.to_string(),
        city: city.to_string(),
        price: Some(price),
        bedrooms: Some(beds),
        bathrooms: Some(baths),
        sqft: Some(sqft),
        latitude: None,
        longitude: None,
        description: Some("Sample listing shown while live results are unavailable".to_string()),
        url: None,
        image_url: None,
        pois: Vec::new(),
    })
    .collect()
}
