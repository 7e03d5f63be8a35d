//! Per-session conversation state and its in-memory store
//!
//! Sessions are process-lifetime only: created on first message, updated on
//! each turn, never persisted. The store also hands out a per-session turn
//! mutex so concurrent messages for one session are processed strictly FIFO.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{Requirements, SessionPhase};

/// Who produced a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Agent,
}

/// One turn of the scoping conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Agent,
            content: content.into(),
        }
    }
}

/// A chat session: ordered turn history plus the requirements record
/// accumulated so far
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: String,
    pub turns: Vec<ChatTurn>,
    pub requirements: Requirements,
    pub phase: SessionPhase,
    /// Unix epoch milliseconds
    pub created_at: u64,
    pub updated_at: u64,
}

impl ConversationSession {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            session_id: session_id.into(),
            turns: Vec::new(),
            requirements: Requirements::default(),
            phase: SessionPhase::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_turn(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
        self.updated_at = now_millis();
    }

    /// Render the history as a plain transcript for LLM prompts:
    /// "User: ...\nAgent: ..."
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|t| {
                let speaker = match t.role {
                    TurnRole::User => "User",
                    TurnRole::Agent => "Agent",
                };
                format!("{}: {}", speaker, t.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            phase: self.phase,
            turn_count: self.turns.len(),
            requirements_complete: self.requirements.is_complete(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Listing-friendly view of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub phase: SessionPhase,
    pub turn_count: usize,
    pub requirements_complete: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// In-memory session store.
///
/// State is cloned out and saved back under the caller's turn lock, so
/// per-session reads and writes never interleave across turns.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, ConversationSession>>,
    turn_locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
    max_turns_per_session: usize,
}

impl SessionStore {
    pub fn new(max_turns_per_session: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            turn_locks: RwLock::new(HashMap::new()),
            max_turns_per_session,
        }
    }

    /// Turn mutex for a session. Callers hold the guard for the whole turn;
    /// a second message for the same session waits here.
    pub async fn turn_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.turn_locks.read().await.get(session_id) {
            return lock.clone();
        }
        let mut locks = self.turn_locks.write().await;
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Load a session, creating it on first contact
    pub async fn get_or_create(&self, session_id: &str) -> ConversationSession {
        if let Some(session) = self.sessions.read().await.get(session_id) {
            return session.clone();
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| ConversationSession::new(session_id))
            .clone()
    }

    pub async fn load(&self, session_id: &str) -> Option<ConversationSession> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Write a session back, trimming history to the configured bound
    pub async fn save(&self, mut session: ConversationSession) {
        if session.turns.len() > self.max_turns_per_session {
            let excess = session.turns.len() - self.max_turns_per_session;
            session.turns.drain(0..excess);
        }
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), session);
    }

    pub async fn delete(&self, session_id: &str) -> bool {
        self.turn_locks.write().await.remove(session_id);
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Summaries of all sessions, most recently updated first
    pub async fn list(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.read().await;
        let mut summaries: Vec<SessionSummary> = sessions.values().map(|s| s.to_summary()).collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries
    }
}
