use config::{Config, File};
use serde::{Deserialize, Serialize};

pub mod validator;

use crate::cli::Cli;

#[derive(Debug, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub research: ResearchSettings,
    #[serde(default)]
    pub geo: GeoSettings,
    #[serde(default)]
    pub scrape: ScrapeSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// LLM endpoint configuration. The default endpoint is the hosted ASI:1
/// service; any OpenAI-compatible gateway works.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key_env: default_llm_api_key_env(),
            temperature: None,
            max_tokens: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_llm_base_url() -> String {
    "https://api.asi1.ai/v1".to_string()
}

fn default_llm_model() -> String {
    "asi1-mini".to_string()
}

fn default_llm_api_key_env() -> String {
    "ASI_API_KEY".to_string()
}

/// Search endpoint configuration (Tavily wire format)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchSettings {
    #[serde(default = "default_search_base_url")]
    pub base_url: String,
    #[serde(default = "default_search_api_key_env")]
    pub api_key_env: String,
    /// Tavily search depth: "basic" or "advanced"
    #[serde(default = "default_search_depth")]
    pub search_depth: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            base_url: default_search_base_url(),
            api_key_env: default_search_api_key_env(),
            search_depth: default_search_depth(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_search_base_url() -> String {
    "https://api.tavily.com".to_string()
}

fn default_search_api_key_env() -> String {
    "TAVILY_API_KEY".to_string()
}

fn default_search_depth() -> String {
    "advanced".to_string()
}

/// Research stage policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResearchSettings {
    /// Results requested from the search provider per query
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// How many listings get the geocode/image/POI enrichment pass
    #[serde(default = "default_enrich_top")]
    pub enrich_top: usize,
    /// Listing sites results must come from
    #[serde(default = "default_allow_domains")]
    pub allow_domains: Vec<String>,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            enrich_top: default_enrich_top(),
            allow_domains: default_allow_domains(),
        }
    }
}

fn default_max_results() -> usize {
    10
}

fn default_enrich_top() -> usize {
    5
}

fn default_allow_domains() -> Vec<String> {
    [
        "redfin.com",
        "zillow.com",
        "realtor.com",
        "trulia.com",
        "homes.com",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Geocoding configuration (Mapbox). Enrichment is skipped when the token
/// environment variable is unset.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeoSettings {
    #[serde(default = "default_geo_base_url")]
    pub base_url: String,
    #[serde(default = "default_geo_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_pois_per_category")]
    pub pois_per_category: usize,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for GeoSettings {
    fn default() -> Self {
        Self {
            base_url: default_geo_base_url(),
            api_key_env: default_geo_api_key_env(),
            pois_per_category: default_pois_per_category(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_geo_base_url() -> String {
    "https://api.mapbox.com".to_string()
}

fn default_geo_api_key_env() -> String {
    "MAPBOX_API_KEY".to_string()
}

fn default_pois_per_category() -> usize {
    2
}

/// Listing-page scraper configuration (MCP endpoint). Image scraping is
/// skipped when the token environment variable is unset.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrapeSettings {
    #[serde(default = "default_scrape_base_url")]
    pub base_url: String,
    #[serde(default = "default_scrape_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_scrape_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            base_url: default_scrape_base_url(),
            api_key_env: default_scrape_api_key_env(),
            timeout_seconds: default_scrape_timeout(),
        }
    }
}

fn default_scrape_base_url() -> String {
    "https://mcp.brightdata.com/mcp".to_string()
}

fn default_scrape_api_key_env() -> String {
    "BRIGHT_DATA_API_KEY".to_string()
}

fn default_scrape_timeout() -> u64 {
    60
}

/// Session store bounds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionSettings {
    /// Oldest turns are dropped past this bound
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

fn default_max_turns() -> usize {
    100
}

fn default_timeout() -> u64 {
    30
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_path(std::path::Path::new("hestia.toml"))
    }

    /// Create settings from CLI arguments (config file plus CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::from_path(&cli.config)?;
        settings.apply_cli_overrides(cli);

        validator::ConfigValidator::validate(&settings).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })?;

        Ok(settings)
    }

    fn from_path(path: &std::path::Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .build()?;

        Ok(s.try_deserialize()?)
    }

    /// Apply CLI argument overrides (CLI > env vars > config file)
    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(host) = &cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(model) = &cli.llm_model {
            self.llm.model = model.clone();
        }
        if let Some(base_url) = &cli.llm_base_url {
            self.llm.base_url = base_url.clone();
        }
    }
}
