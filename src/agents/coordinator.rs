//! Coordinator: per-session state machine sequencing scoping and research
//!
//! Each chat turn runs one sequential pipeline under the session's turn
//! lock: scoping always runs first; research fires only once the
//! requirements record is complete; general questions are answered without
//! leaving the scoping phase. Progress events stream out while the turn
//! runs and every turn terminates with exactly one `complete` event.

use std::sync::Arc;

use tracing::info;

use crate::agents::general::{self, GeneralStage};
use crate::agents::research::ResearchStage;
use crate::agents::scoping::{self, ScopingOutcome, ScopingStage};
use crate::domain::{ChatEvent, ChatResult, ChatStream, ChatStreamSender, Requirements, SessionPhase};
use crate::session::{ChatTurn, SessionStore};

/// Agent name used in progress events and logs
pub const AGENT_NAME: &str = "coordinator";

pub struct Coordinator {
    sessions: Arc<SessionStore>,
    scoping: ScopingStage,
    general: GeneralStage,
    research: ResearchStage,
}

impl Coordinator {
    pub fn new(
        sessions: Arc<SessionStore>,
        scoping: ScopingStage,
        general: GeneralStage,
        research: ResearchStage,
    ) -> Self {
        Self {
            sessions,
            scoping,
            general,
            research,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Process one chat message, streaming progress events and a terminal
    /// result. The stream ends when the turn is over.
    pub fn handle_message(self: &Arc<Self>, session_id: String, message: String) -> ChatStream {
        let (sender, stream) = ChatStream::channel(64);
        let coordinator = self.clone();

        tokio::spawn(async move {
            coordinator.run_turn(session_id, message, sender).await;
        });

        stream
    }

    async fn run_turn(&self, session_id: String, message: String, sender: ChatStreamSender) {
        // Messages for one session are strictly FIFO: a second message
        // waits here until the in-flight turn finishes.
        let lock = self.sessions.turn_lock(&session_id).await;
        let _guard = lock.lock().await;

        info!(session_id = %session_id, "processing chat turn");

        let mut session = self.sessions.get_or_create(&session_id).await;
        session.phase = SessionPhase::AwaitingRequirements;

        sender
            .progress(scoping::AGENT_NAME, "Reviewing your requirements")
            .await;
        let outcome = self.scoping.run(&mut session, &message).await;

        let result = if let Some(question) = &outcome.general_question {
            sender
                .progress(general::AGENT_NAME, "Looking that up for you")
                .await;
            let answer = self.general.run(question).await;
            session.add_turn(ChatTurn::agent(&answer));
            ChatResult::reply(outcome.requirements.clone(), answer)
        } else if outcome.ready {
            session.phase = SessionPhase::Researching;
            sender
                .progress(
                    AGENT_NAME,
                    format!(
                        "Requirements complete, searching for {}",
                        session.requirements.describe()
                    ),
                )
                .await;
            let result = self.research.run(&session.requirements, &sender).await;
            session.phase = SessionPhase::Complete;
            result
        } else {
            ChatResult::reply(outcome.requirements.clone(), outcome.reply.clone())
        };

        self.sessions.save(session).await;
        sender.send(ChatEvent::complete(result)).await;
    }

    /// Run only the scoping stage for one turn, without triggering research.
    /// Backs the internal `POST /chat` endpoint.
    pub async fn scope_turn(&self, session_id: &str, message: &str) -> ScopingOutcome {
        let lock = self.sessions.turn_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut session = self.sessions.get_or_create(session_id).await;
        let outcome = self.scoping.run(&mut session, message).await;
        self.sessions.save(session).await;
        outcome
    }

    /// Run the research stage directly on a completed requirements record.
    /// Backs the internal `POST /search` endpoint; callers must validate
    /// completeness first.
    pub async fn research_direct(&self, requirements: &Requirements) -> ChatResult {
        // Progress events have nowhere to go on the non-streaming path.
        let (sender, _stream) = ChatStream::channel(8);
        self.research.run(requirements, &sender).await
    }
}
