//! Scripted test doubles for the stage collaborators

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::agents::error::{AgentError, AgentResult, LlmError, LlmResult, SearchError};
use crate::agents::geo::{GeocodedAddress, Geocoder};
use crate::agents::llm::{CompletionRequest, CompletionResponse, LlmProvider};
use crate::agents::scrape::PageScraper;
use crate::agents::search::{SearchHit, SearchProvider, SearchQuery, SearchResponse};
use crate::domain::Poi;

/// LLM double that plays back canned responses in order
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
    failing: bool,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            failing: false,
        }
    }

    /// Double whose every call fails with a network error
    pub fn failing() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            failing: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
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
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(LlmError::Network("scripted failure".to_string()));
        }
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
    answer: Option<String>,
    calls: AtomicUsize,
    failing: bool,
}

impl StaticSearch {
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            answer: None,
            calls: AtomicUsize::new(0),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            hits: Vec::new(),
            answer: None,
            calls: AtomicUsize::new(0),
            failing: true,
        }
    }

    pub fn answer(mut self, answer: &str) -> Self {
        self.answer = Some(answer.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, _query: SearchQuery) -> Result<SearchResponse, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(SearchError::Network("scripted failure".to_string()));
        }
        Ok(SearchResponse {
            hits: self.hits.clone(),
            answer: self.answer.clone(),
        })
    }
}

/// Geocoder double resolving every address to one coordinate
pub struct StaticGeocoder {
    latitude: f64,
    longitude: f64,
}

impl StaticGeocoder {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, address: &str) -> AgentResult<GeocodedAddress> {
        Ok(GeocodedAddress {
            latitude: self.latitude,
            longitude: self.longitude,
            full_address: address.to_string(),
        })
    }

    async fn nearby_pois(&self, latitude: f64, longitude: f64) -> AgentResult<Vec<Poi>> {
        Ok(vec![Poi {
            name: "Chabot Elementary".to_string(),
            category: "school".to_string(),
            latitude,
            longitude,
            address: None,
            distance_meters: Some(400),
        }])
    }
}

/// Scraper double returning fixed markdown
pub struct StaticScraper {
    markdown: String,
    failing: bool,
}

impl StaticScraper {
    pub fn with_markdown(markdown: &str) -> Self {
        Self {
            markdown: markdown.to_string(),
            failing: false,
        }
    }

    #[allow(dead_code)]
    pub fn failing() -> Self {
        Self {
            markdown: String::new(),
            failing: true,
        }
    }
}

#[async_trait]
impl PageScraper for StaticScraper {
    async fn scrape_markdown(&self, _url: &str) -> AgentResult<String> {
        if self.failing {
            return Err(AgentError::Scrape("scripted failure".to_string()));
        }
        Ok(self.markdown.clone())
    }
}
