//! Error types for the agent pipeline

use thiserror::Error;

/// Errors that can occur while running a stage or the coordinator
#[derive(Debug, Error)]
pub enum AgentError {
    /// Session not found
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Search provider error
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Geocoding or POI discovery error
    #[error("Geocoding error: {0}")]
    Geocode(String),

    /// Page scraping error
    #[error("Scrape error: {0}")]
    Scrape(String),

    /// Execution error
    #[error("Execution error: {0}")]
    Execution(String),
}

/// Errors specific to LLM provider operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// API returned a non-success status
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Authentication error (missing or rejected key)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Response did not parse as the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_connect() {
            LlmError::Network(format!("Connection error: {}", err))
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

/// Errors specific to the search provider
#[derive(Debug, Error)]
pub enum SearchError {
    /// API returned a non-success status
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Authentication error (missing or rejected key)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Response did not parse as the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Execution(format!("Serialization error: {}", err))
    }
}

/// Result type alias for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

/// Result type alias for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Result type alias for search operations
pub type SearchResult<T> = Result<T, SearchError>;
