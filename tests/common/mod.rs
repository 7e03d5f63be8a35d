//! Shared test fixtures: scripted collaborator doubles and an app builder

use async_trait::async_trait;
use axum::Router;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use hestia::agents::coordinator::Coordinator;
use hestia::agents::error::{AgentResult, LlmError, LlmResult, SearchError};
use hestia::agents::general::GeneralStage;
use hestia::agents::geo::{GeocodedAddress, Geocoder};
use hestia::agents::llm::{CompletionRequest, CompletionResponse, LlmProvider};
use hestia::agents::research::ResearchStage;
use hestia::agents::scoping::ScopingStage;
use hestia::agents::search::{SearchHit, SearchProvider, SearchQuery, SearchResponse};
use hestia::config::ResearchSettings;
use hestia::domain::Poi;
use hestia::relay::health::HealthHandler;
use hestia::relay::RelayState;
use hestia::session::SessionStore;

/// LLM double playing back canned responses in order
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: CompletionRequest) -> LlmResult<CompletionResponse> {
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(content) => Ok(CompletionResponse { content }),
            None => Err(LlmError::Parse("script exhausted".to_string())),
        }
    }
}

/// Search double returning a fixed hit list
pub struct StaticSearch {
    hits: Vec<SearchHit>,
}

impl StaticSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self { hits }
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, _query: SearchQuery) -> Result<SearchResponse, SearchError> {
        Ok(SearchResponse {
            hits: self.hits.clone(),
            answer: None,
        })
    }
}

/// Geocoder double pinning every address to one coordinate
pub struct StaticGeocoder;

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, address: &str) -> AgentResult<GeocodedAddress> {
        Ok(GeocodedAddress {
            latitude: 37.8044,
            longitude: -122.2712,
            full_address: address.to_string(),
        })
    }

    async fn nearby_pois(&self, latitude: f64, longitude: f64) -> AgentResult<Vec<Poi>> {
        Ok(vec![Poi {
            name: "Lakeview Elementary".to_string(),
            category: "school".to_string(),
            latitude,
            longitude,
            address: None,
            distance_meters: Some(350),
        }])
    }
}

pub fn oakland_hit() -> SearchHit {
    SearchHit {
        title: "500 29th St, Oakland, CA 94609".to_string(),
        url: "https://www.redfin.com/CA/Oakland/500-29th-St-94609".to_string(),
        content: "3 bed 2 bath craftsman in Oakland".to_string(),
    }
}

/// Build the full application with scripted collaborators
pub fn app(llm_responses: Vec<String>, hits: Vec<SearchHit>, with_geocoder: bool) -> Router {
    let llm: Arc<dyn LlmProvider> = Arc::new(ScriptedLlm::new(llm_responses));
    let search: Arc<dyn SearchProvider> = Arc::new(StaticSearch::new(hits));
    let geocoder: Option<Arc<dyn Geocoder>> = if with_geocoder {
        Some(Arc::new(StaticGeocoder))
    } else {
        None
    };

    let sessions = Arc::new(SessionStore::new(100));
    let coordinator = Arc::new(Coordinator::new(
        sessions,
        ScopingStage::new(llm.clone()),
        GeneralStage::new(llm.clone(), search.clone(), 10),
        ResearchStage::new(
            llm,
            search,
            geocoder.clone(),
            None,
            ResearchSettings::default(),
        ),
    ));

    let state = RelayState {
        coordinator,
        geocoder,
    };
    hestia::create_app(state, Arc::new(HealthHandler::new()))
}
