//! Scoping stage: elicit a complete requirements record through conversation
//!
//! The LLM does extraction and phrasing; completion is decided here by
//! `Requirements::is_complete`, never by the model.

use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::agents::llm::{parse_json_payload, CompletionRequest, LlmProvider, Message};
use crate::domain::{Requirements, RequirementsPatch};
use crate::session::{ChatTurn, ConversationSession};

/// Agent name used in progress events and logs
pub const AGENT_NAME: &str = "scoping";

const SYSTEM_PROMPT: &str = "\
You are a friendly real estate agent helping users find their next home.

Your job is to gather search requirements through natural conversation:
1. Budget (minimum and/or maximum price)
2. Number of bedrooms
3. Number of bathrooms
4. Location (city or neighborhood)

RULES:
- Be conversational and friendly
- Ask a follow-up question only for information you still need
- If the user is asking a general question (about neighborhoods, schools, \
safety, amenities, local info), capture the question instead of answering it

Respond with only a JSON object in this exact shape:
{
  \"reply\": \"<your reply or follow-up question>\",
  \"general_question\": \"<the user's question if they asked one, else null>\",
  \"requirements\": {
    \"budget_min\": <number or null>,
    \"budget_max\": <number or null>,
    \"bedrooms\": <number or null>,
    \"bathrooms\": <number or null>,
    \"location\": \"<city or area, or null>\",
    \"additional_info\": \"<other stated preferences, or null>\"
  }
}
Use plain numbers (800000, not \"800k\"). Only include values the \
conversation actually established.";

const FALLBACK_REPLY: &str =
    "I'm having trouble processing your request right now. Could you try again?";

/// What one scoping turn produced
#[derive(Debug, Clone)]
pub struct ScopingOutcome {
    /// Natural-language reply to show the user
    pub reply: String,
    /// Requirements snapshot after merging this turn's extraction
    pub requirements: Requirements,
    /// True when the record is complete and research may start
    pub ready: bool,
    /// Set when the turn was a general question rather than search input
    pub general_question: Option<String>,
}

/// Per-turn extraction payload the LLM returns
#[derive(Debug, Default, Deserialize)]
struct Extraction {
    #[serde(default)]
    reply: String,
    #[serde(default)]
    general_question: Option<String>,
    #[serde(default)]
    requirements: RequirementsPatch,
}

pub struct ScopingStage {
    llm: Arc<dyn LlmProvider>,
}

impl ScopingStage {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Run one scoping turn: record the user message, extract requirements,
    /// merge them, and record the reply.
    ///
    /// LLM failure and unparsable output are recoverable: the session keeps
    /// its requirements untouched and the user is asked to repeat.
    pub async fn run(&self, session: &mut ConversationSession, user_message: &str) -> ScopingOutcome {
        session.add_turn(ChatTurn::user(user_message));

        let extraction = match self.extract(session).await {
            Some(extraction) => extraction,
            None => {
                session.add_turn(ChatTurn::agent(FALLBACK_REPLY));
                return ScopingOutcome {
                    reply: FALLBACK_REPLY.to_string(),
                    requirements: session.requirements.clone(),
                    ready: false,
                    general_question: None,
                };
            }
        };

        // General questions carry no extraction to merge.
        let general_question = extraction
            .general_question
            .filter(|q| !q.trim().is_empty());
        if general_question.is_none() {
            session.requirements.merge(extraction.requirements);
        }

        let reply = if extraction.reply.trim().is_empty() {
            "What else can you tell me about the home you're looking for?".to_string()
        } else {
            extraction.reply
        };
        session.add_turn(ChatTurn::agent(&reply));

        let ready = general_question.is_none() && session.requirements.is_complete();
        ScopingOutcome {
            reply,
            requirements: session.requirements.clone(),
            ready,
            general_question,
        }
    }

    /// Query the LLM, retrying once when the payload doesn't parse
    async fn extract(&self, session: &ConversationSession) -> Option<Extraction> {
        let prompt = format!(
            "Conversation so far:\n{}\n\nExtract the requirements established \
             so far and produce your next reply as the JSON object described \
             in your instructions.",
            session.transcript()
        );

        let request = CompletionRequest::new(SYSTEM_PROMPT, &prompt)
            .with_temperature(0.3)
            .with_max_tokens(800);

        let response = match self.llm.complete(request.clone()).await {
            Ok(r) => r,
            Err(e) => {
                warn!(agent = AGENT_NAME, error = %e, "LLM call failed");
                return None;
            }
        };

        match parse_json_payload::<Extraction>(&response.content) {
            Ok(extraction) => Some(extraction),
            Err(e) => {
                warn!(agent = AGENT_NAME, error = %e, "unparsable extraction, re-prompting");
                self.reprompt(request).await
            }
        }
    }

    /// Single re-ask after malformed output; no further retries
    async fn reprompt(&self, mut request: CompletionRequest) -> Option<Extraction> {
        request.messages.push(Message::user(
            "Your previous reply was not valid JSON. Respond with only the \
             JSON object described in your instructions.",
        ));

        let response = self.llm.complete(request).await.ok()?;
        parse_json_payload(&response.content).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::ScriptedLlm;
    use serde_json::json;

    fn extraction(reply: &str, requirements: serde_json::Value) -> String {
        json!({
            "reply": reply,
            "general_question": null,
            "requirements": requirements,
        })
        .to_string()
    }

    #[tokio::test]
    async fn accumulates_requirements_across_turns() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            extraction(
                "Got it, 3 bedrooms in Oakland under $800k. How many bathrooms?",
                json!({"bedrooms": 3, "location": "Oakland", "budget_max": 800000}),
            ),
            extraction(
                "Perfect, let me find homes with good schools nearby.",
                json!({"bathrooms": 2, "additional_info": "good schools"}),
            ),
        ]));
        let stage = ScopingStage::new(llm);
        let mut session = ConversationSession::new("s1");

        let first = stage
            .run(&mut session, "3 bedrooms in Oakland, budget $800k")
            .await;
        assert!(first.ready);
        assert_eq!(first.requirements.bedrooms, Some(3));

        let second = stage.run(&mut session, "2 bathrooms, good schools").await;
        assert!(second.ready);
        assert_eq!(second.requirements.bedrooms, Some(3));
        assert_eq!(second.requirements.bathrooms, Some(2));
        assert_eq!(second.requirements.location, "Oakland");
        assert_eq!(second.requirements.budget_max, Some(800_000));
        assert_eq!(
            second.requirements.additional_info.as_deref(),
            Some("good schools")
        );
    }

    #[tokio::test]
    async fn incomplete_requirements_are_not_ready() {
        let llm = Arc::new(ScriptedLlm::new(vec![extraction(
            "What's your budget?",
            json!({"bedrooms": 2, "location": "Berkeley"}),
        )]));
        let stage = ScopingStage::new(llm);
        let mut session = ConversationSession::new("s1");

        let outcome = stage.run(&mut session, "2 bedrooms in Berkeley").await;
        assert!(!outcome.ready);
        assert_eq!(outcome.reply, "What's your budget?");
    }

    #[tokio::test]
    async fn general_question_skips_merge_and_ready() {
        let llm = Arc::new(ScriptedLlm::new(vec![json!({
            "reply": "I'll look that up for you.",
            "general_question": "What are schools like in Rockridge?",
            "requirements": {"location": "Rockridge"},
        })
        .to_string()]));
        let stage = ScopingStage::new(llm);
        let mut session = ConversationSession::new("s1");
        session.requirements.location = "Oakland".to_string();

        let outcome = stage
            .run(&mut session, "What are schools like in Rockridge?")
            .await;
        assert_eq!(
            outcome.general_question.as_deref(),
            Some("What are schools like in Rockridge?")
        );
        assert!(!outcome.ready);
        // The aside must not disturb the accumulated record.
        assert_eq!(session.requirements.location, "Oakland");
    }

    #[tokio::test]
    async fn llm_failure_is_recoverable() {
        let llm = Arc::new(ScriptedLlm::failing());
        let stage = ScopingStage::new(llm);
        let mut session = ConversationSession::new("s1");
        session.requirements.bedrooms = Some(3);

        let outcome = stage.run(&mut session, "anything").await;
        assert!(!outcome.ready);
        assert_eq!(outcome.reply, FALLBACK_REPLY);
        assert_eq!(session.requirements.bedrooms, Some(3));
    }

    #[tokio::test]
    async fn malformed_output_triggers_single_reprompt() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            "Sure! Here is what I found.".to_string(),
            extraction("Thanks!", json!({"bedrooms": 1})),
        ]));
        let stage = ScopingStage::new(llm.clone());
        let mut session = ConversationSession::new("s1");

        let outcome = stage.run(&mut session, "1 bedroom").await;
        assert_eq!(outcome.requirements.bedrooms, Some(1));
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn malformed_output_twice_falls_back() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            "not json".to_string(),
            "still not json".to_string(),
        ]));
        let stage = ScopingStage::new(llm.clone());
        let mut session = ConversationSession::new("s1");

        let outcome = stage.run(&mut session, "1 bedroom").await;
        assert_eq!(outcome.reply, FALLBACK_REPLY);
        assert_eq!(llm.calls(), 2);
    }
}
