//! General stage: answer neighborhood/area questions from web search results

use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::agents::llm::{parse_json_payload, CompletionRequest, LlmProvider};
use crate::agents::search::{SearchProvider, SearchQuery};

/// Agent name used in progress events and logs
pub const AGENT_NAME: &str = "general";

const SYSTEM_PROMPT: &str = "\
You are a knowledgeable real estate assistant who answers general questions \
about neighborhoods, areas, schools, amenities, and local information.

RULES:
- Answer conversationally and naturally
- Use the search results to provide accurate information
- If the search results don't contain the answer, say so honestly
- Focus on information relevant to someone looking for a home
- Be concise but informative

Respond with only a JSON object in this format:
{
  \"answer\": \"<your answer to the user's question>\"
}";

const FALLBACK_ANSWER: &str = "I'm having trouble looking that up right now. \
Please try again in a moment.";

/// How many search hits feed the answer prompt
const CONTEXT_HITS: usize = 5;
/// How much of each hit's content makes it into the prompt
const CONTEXT_SNIPPET_LEN: usize = 800;

#[derive(Debug, Deserialize)]
struct GeneralAnswer {
    answer: String,
}

pub struct GeneralStage {
    llm: Arc<dyn LlmProvider>,
    search: Arc<dyn SearchProvider>,
    max_results: usize,
}

impl GeneralStage {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchProvider>,
        max_results: usize,
    ) -> Self {
        Self {
            llm,
            search,
            max_results,
        }
    }

    /// Answer a general question. Search or LLM failure degrades to an
    /// apologetic reply, never an error.
    pub async fn run(&self, question: &str) -> String {
        let response = match self
            .search
            .search(SearchQuery::new(question, self.max_results))
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(agent = AGENT_NAME, error = %e, "search failed");
                return FALLBACK_ANSWER.to_string();
            }
        };

        let mut context = format!("User Question: {}\n\nSearch Results:\n\n", question);
        for (idx, hit) in response.hits.iter().take(CONTEXT_HITS).enumerate() {
            let snippet: String = hit.content.chars().take(CONTEXT_SNIPPET_LEN).collect();
            context.push_str(&format!(
                "Result {}:\nTitle: {}\nURL: {}\nContent: {}\n\n",
                idx + 1,
                hit.title,
                hit.url,
                snippet
            ));
        }

        let prompt = format!(
            "{}Based on the search results above, answer the user's question: \
             \"{}\"\n\nRespond with a JSON object as specified in your \
             instructions.",
            context, question
        );

        let request = CompletionRequest::new(SYSTEM_PROMPT, &prompt)
            .with_temperature(0.3)
            .with_max_tokens(800);

        match self.llm.complete(request).await {
            Ok(completion) => match parse_json_payload::<GeneralAnswer>(&completion.content) {
                Ok(parsed) if !parsed.answer.trim().is_empty() => parsed.answer,
                _ => {
                    // The search engine's own synthesis beats an apology.
                    response.answer.unwrap_or_else(|| FALLBACK_ANSWER.to_string())
                }
            },
            Err(e) => {
                warn!(agent = AGENT_NAME, error = %e, "LLM call failed");
                response.answer.unwrap_or_else(|| FALLBACK_ANSWER.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::{ScriptedLlm, StaticSearch};
    use crate::agents::search::SearchHit;
    use serde_json::json;

    fn hits() -> Vec<SearchHit> {
        vec![SearchHit {
            title: "Rockridge schools".to_string(),
            url: "https://example.com/rockridge".to_string(),
            content: "Rockridge has well-rated public schools.".to_string(),
        }]
    }

    #[tokio::test]
    async fn answers_from_llm() {
        let llm = Arc::new(ScriptedLlm::new(vec![json!({
            "answer": "Rockridge schools are well rated."
        })
        .to_string()]));
        let stage = GeneralStage::new(llm, Arc::new(StaticSearch::with_hits(hits())), 10);

        let answer = stage.run("What are schools like in Rockridge?").await;
        assert_eq!(answer, "Rockridge schools are well rated.");
    }

    #[tokio::test]
    async fn llm_failure_uses_engine_answer() {
        let llm = Arc::new(ScriptedLlm::failing());
        let search = StaticSearch::with_hits(hits()).answer("Engine synthesis.");
        let stage = GeneralStage::new(llm, Arc::new(search), 10);

        let answer = stage.run("schools?").await;
        assert_eq!(answer, "Engine synthesis.");
    }

    #[tokio::test]
    async fn search_failure_degrades_to_apology() {
        let llm = Arc::new(ScriptedLlm::new(vec![]));
        let stage = GeneralStage::new(llm, Arc::new(StaticSearch::failing()), 10);

        let answer = stage.run("schools?").await;
        assert_eq!(answer, FALLBACK_ANSWER);
    }
}
