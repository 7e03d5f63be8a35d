use thiserror::Error;

use crate::config::{
    GeoSettings, LlmSettings, ResearchSettings, ScrapeSettings, SearchSettings, ServerSettings,
    Settings,
};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_server(&settings.server) {
            errors.extend(e);
        }
        if let Err(e) = Self::validate_llm(&settings.llm) {
            errors.extend(e);
        }
        if let Err(e) = Self::validate_search(&settings.search) {
            errors.extend(e);
        }
        if let Err(e) = Self::validate_research(&settings.research) {
            errors.extend(e);
        }
        if let Err(e) = Self::validate_geo(&settings.geo) {
            errors.extend(e);
        }
        if let Err(e) = Self::validate_scrape(&settings.scrape) {
            errors.extend(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_server(server: &ServerSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if server.host.is_empty() {
            errors.push(ValidationError::MissingField("server.host".to_string()));
        }
        if server.port == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_llm(llm: &LlmSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if llm.model.is_empty() {
            errors.push(ValidationError::MissingField("llm.model".to_string()));
        }
        if llm.api_key_env.is_empty() {
            errors.push(ValidationError::MissingField("llm.api_key_env".to_string()));
        }
        Self::check_url(&llm.base_url, "llm.base_url", &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_search(search: &SearchSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if search.api_key_env.is_empty() {
            errors.push(ValidationError::MissingField(
                "search.api_key_env".to_string(),
            ));
        }
        if search.search_depth != "basic" && search.search_depth != "advanced" {
            errors.push(ValidationError::InvalidValue {
                field: "search.search_depth".to_string(),
                reason: "Must be \"basic\" or \"advanced\"".to_string(),
            });
        }
        Self::check_url(&search.base_url, "search.base_url", &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_research(research: &ResearchSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if research.max_results == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "research.max_results".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }
        if research.enrich_top == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "research.enrich_top".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }
        if research.allow_domains.is_empty() {
            errors.push(ValidationError::MissingField(
                "research.allow_domains".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_geo(geo: &GeoSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        Self::check_url(&geo.base_url, "geo.base_url", &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_scrape(scrape: &ScrapeSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        Self::check_url(&scrape.base_url, "scrape.base_url", &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn check_url(url: &str, field: &str, errors: &mut Vec<ValidationError>) {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            errors.push(ValidationError::InvalidValue {
                field: field.to_string(),
                reason: "Must be an http(s) URL".to_string(),
            });
        }
    }
}
