//! Web search client
//!
//! Wraps the Tavily search API. The research stage restricts queries to a
//! fixed allow-list of listing domains; the general stage searches the open
//! web.

mod tavily;

pub use tavily::TavilyProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::agents::error::SearchResult as SearchOpResult;
use crate::config::SearchSettings;

/// One hit returned by the search provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    /// Snippet or extracted page content
    #[serde(default)]
    pub content: String,
}

/// Parameters of one search call
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub query: String,
    pub max_results: usize,
    /// Restrict results to these domains; empty means no restriction
    pub include_domains: Vec<String>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results,
            include_domains: Vec::new(),
        }
    }

    pub fn with_domains(mut self, domains: &[String]) -> Self {
        self.include_domains = domains.to_vec();
        self
    }
}

/// Search response: ordered hits plus the engine's own answer synthesis
/// when it produced one
#[derive(Debug, Clone, Default)]
pub struct SearchResponse {
    pub hits: Vec<SearchHit>,
    pub answer: Option<String>,
}

/// Trait for search providers
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Run one search
    async fn search(&self, query: SearchQuery) -> SearchOpResult<SearchResponse>;
}

/// Create the configured search provider
pub fn create_provider(settings: &SearchSettings) -> SearchOpResult<Arc<dyn SearchProvider>> {
    let provider = TavilyProvider::new(settings)?;
    Ok(Arc::new(provider))
}
