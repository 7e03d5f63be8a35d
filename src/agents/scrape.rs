//! Listing-page scraper
//!
//! Fetches a listing page as markdown through the scraping service's MCP
//! endpoint (JSON-RPC over HTTP) so research can pull one representative
//! image per listing. Optional: when no scraper token is configured the
//! pipeline simply skips images.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::agents::error::{AgentError, AgentResult};
use crate::config::ScrapeSettings;

/// Trait for page scrapers
#[async_trait]
pub trait PageScraper: Send + Sync {
    /// Fetch a page rendered as markdown
    async fn scrape_markdown(&self, url: &str) -> AgentResult<String>;
}

/// Scraper speaking MCP JSON-RPC against the configured endpoint,
/// calling its `scrape_as_markdown` tool
pub struct McpScraper {
    client: reqwest::Client,
    endpoint: String,
    request_id: AtomicU64,
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Debug, Deserialize)]
struct CallToolResult {
    #[serde(default)]
    content: Vec<ContentItem>,
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

impl McpScraper {
    /// Create a scraper when a token is configured; `None` disables scraping
    pub fn from_settings(settings: &ScrapeSettings) -> Option<Arc<dyn PageScraper>> {
        let token = env::var(&settings.api_key_env).ok()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .ok()?;

        Some(Arc::new(Self {
            client,
            endpoint: format!("{}?token={}", settings.base_url.trim_end_matches('/'), token),
            request_id: AtomicU64::new(0),
        }))
    }

    async fn call_tool(&self, tool: &str, arguments: Value) -> AgentResult<String> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.request_id.fetch_add(1, Ordering::Relaxed) + 1,
            method: "tools/call".to_string(),
            params: json!({ "name": tool, "arguments": arguments }),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Scrape(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::Scrape(format!(
                "Scraper returned {}: {}",
                status, text
            )));
        }

        let rpc: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Scrape(format!("Bad JSON-RPC response: {}", e)))?;

        if let Some(error) = rpc.error {
            return Err(AgentError::Scrape(format!(
                "[{}] {}",
                error.code, error.message
            )));
        }

        let result = rpc
            .result
            .ok_or_else(|| AgentError::Scrape("No result in response".to_string()))?;
        let call_result: CallToolResult = serde_json::from_value(result)
            .map_err(|e| AgentError::Scrape(format!("Bad tool result: {}", e)))?;

        let output = call_result
            .content
            .into_iter()
            .filter(|item| item.content_type == "text")
            .filter_map(|item| item.text)
            .collect::<Vec<_>>()
            .join("\n");

        if output.is_empty() {
            return Err(AgentError::Scrape("No content returned".to_string()));
        }
        Ok(output)
    }
}

#[async_trait]
impl PageScraper for McpScraper {
    async fn scrape_markdown(&self, url: &str) -> AgentResult<String> {
        self.call_tool("scrape_as_markdown", json!({ "url": url }))
            .await
    }
}

/// Extract the first plausible property image from scraped markdown,
/// skipping icons, logos, and thumbnail-sized assets.
pub fn extract_first_image(markdown: &str) -> Option<String> {
    const SKIP_MARKERS: [&str; 5] = ["icon", "logo", "avatar", "badge", "button"];
    const SKIP_SIZES: [&str; 4] = ["16x16", "32x32", "48x48", "64x64"];

    let mut rest = markdown;
    while let Some(start) = rest.find("![") {
        let after = &rest[start..];
        let Some(open) = after.find("](") else {
            return None;
        };
        let Some(close) = after[open + 2..].find(')') else {
            return None;
        };
        let url = &after[open + 2..open + 2 + close];
        rest = &after[open + 2 + close..];

        if !url.starts_with("http://") && !url.starts_with("https://") {
            continue;
        }
        let lower = url.to_ascii_lowercase();
        if SKIP_MARKERS.iter().any(|m| lower.contains(m)) {
            continue;
        }
        if SKIP_SIZES.iter().any(|s| lower.contains(s)) {
            continue;
        }
        return Some(url.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_real_image() {
        let markdown = "\
# 123 Main St\n\
![site logo](https://cdn.example.com/logo.png)\n\
![front view](https://photos.example.com/homes/123-main.jpg)\n\
![back yard](https://photos.example.com/homes/123-yard.jpg)\n";
        assert_eq!(
            extract_first_image(markdown).as_deref(),
            Some("https://photos.example.com/homes/123-main.jpg")
        );
    }

    #[test]
    fn skips_thumbnail_sizes() {
        let markdown = "![pin](https://cdn.example.com/pin-32x32.png)";
        assert_eq!(extract_first_image(markdown), None);
    }

    #[test]
    fn ignores_relative_urls() {
        let markdown = "![photo](/static/house.jpg)";
        assert_eq!(extract_first_image(markdown), None);
    }

    #[test]
    fn no_images_returns_none() {
        assert_eq!(extract_first_image("just text, [a link](https://x.y)"), None);
    }
}
