//! LLM client over an OpenAI-compatible chat-completions API
//!
//! The hosted endpoint (ASI:1 by default) speaks the OpenAI wire format, so a
//! single provider covers it and any compatible self-hosted model. Stages
//! depend on the `LlmProvider` trait and tests substitute scripted doubles.

mod openai;

pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::agents::error::{LlmError, LlmResult};
use crate::config::LlmSettings;

/// Message role in a completion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in a completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request for LLM completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// System prompt plus one user message, the shape every stage uses
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt), Message::user(user_prompt)],
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Response from LLM completion
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated assistant text
    pub content: String,
}

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;

    /// Complete a request
    async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse>;
}

/// Create the configured LLM provider
pub fn create_provider(settings: &LlmSettings) -> LlmResult<Arc<dyn LlmProvider>> {
    let provider = OpenAiProvider::new(settings)?;
    Ok(Arc::new(provider))
}

/// Parse a JSON payload out of LLM output, tolerating markdown code fences.
///
/// Models regularly wrap JSON in ```json fences despite instructions not to;
/// strip them before handing the rest to serde.
pub fn parse_json_payload<T: serde::de::DeserializeOwned>(content: &str) -> LlmResult<T> {
    let trimmed = content.trim();
    let stripped = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.strip_suffix("```").unwrap_or(rest))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(stripped).map_err(|e| LlmError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn parses_bare_json() {
        let value: Value = parse_json_payload(r#"{"reply": "hi"}"#).unwrap();
        assert_eq!(value["reply"], "hi");
    }

    #[test]
    fn parses_fenced_json() {
        let content = "```json\n{\"reply\": \"hi\"}\n```";
        let value: Value = parse_json_payload(content).unwrap();
        assert_eq!(value["reply"], "hi");
    }

    #[test]
    fn parses_anonymous_fence() {
        let content = "```\n{\"ok\": true}\n```";
        let value: Value = parse_json_payload(content).unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn rejects_prose() {
        let result: LlmResult<Value> = parse_json_payload("Sure! Here are some homes.");
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }
}
