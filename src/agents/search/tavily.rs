//! Tavily search API client

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::env;
use std::time::Duration;

use super::{SearchHit, SearchProvider, SearchQuery, SearchResponse};
use crate::agents::error::{SearchError, SearchResult};
use crate::config::SearchSettings;

pub struct TavilyProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    search_depth: String,
}

impl TavilyProvider {
    pub fn new(settings: &SearchSettings) -> SearchResult<Self> {
        let api_key = env::var(&settings.api_key_env).map_err(|_| {
            SearchError::Authentication(format!(
                "Environment variable {} not set",
                settings.api_key_env
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            search_depth: settings.search_depth.clone(),
        })
    }
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: SearchQuery) -> SearchResult<SearchResponse> {
        let mut body = json!({
            "api_key": self.api_key,
            "query": query.query,
            "search_depth": self.search_depth,
            "max_results": query.max_results,
            "include_answer": true,
            "include_raw_content": false,
        });

        if !query.include_domains.is_empty() {
            body["include_domains"] = Value::from(query.include_domains.clone());
        }

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(format!("Failed to parse response: {}", e)))?;

        let hits = parsed
            .results
            .into_iter()
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                content: r.content.unwrap_or_default(),
            })
            .collect();

        Ok(SearchResponse {
            hits,
            answer: parsed.answer.filter(|a| !a.is_empty()),
        })
    }
}

// Tavily API response types

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
    #[serde(default)]
    answer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    content: Option<String>,
}
