//! Progress events and the chunk stream carried from the coordinator to the relay

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

use super::listing::{PropertyListing, TopResultCoordinates};
use super::requirements::Requirements;

/// Final payload of one chat turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResult {
    /// Requirements snapshot after this turn's extraction
    pub requirements: Requirements,
    /// Listings found by research; empty while scoping is still under way
    #[serde(default)]
    pub properties: Vec<PropertyListing>,
    /// Natural-language reply or search summary shown in the chat panel
    pub search_summary: String,
    /// Number of results found, before truncation for enrichment
    #[serde(default)]
    pub total_found: usize,
    /// Coordinates of the first geocoded listing, for the map panel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_result_coordinates: Option<TopResultCoordinates>,
}

impl ChatResult {
    /// A conversational result with no listings (scoping replies,
    /// general answers, recoverable errors)
    pub fn reply(requirements: Requirements, message: impl Into<String>) -> Self {
        Self {
            requirements,
            properties: Vec::new(),
            search_summary: message.into(),
            total_found: 0,
            top_result_coordinates: None,
        }
    }
}

/// One streamed event, serialized as a single NDJSON line.
///
/// The wire format is `{"type": ..., "agent": ..., "message": ...}` for
/// progress and error events, and `{"type": "complete", "result": {...}}`
/// for the terminal event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    /// Informational progress from one of the stages
    Progress { agent: String, message: String },
    /// A stage failed; the turn still terminates with a `Complete` event
    Error { agent: String, message: String },
    /// Terminal event carrying the full result
    Complete { result: ChatResult },
}

impl ChatEvent {
    pub fn progress(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Progress {
            agent: agent.into(),
            message: message.into(),
        }
    }

    pub fn error(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            agent: agent.into(),
            message: message.into(),
        }
    }

    pub fn complete(result: ChatResult) -> Self {
        Self::Complete { result }
    }
}

/// Stream of events for one in-flight chat turn
pub struct ChatStream {
    receiver: mpsc::Receiver<ChatEvent>,
}

impl ChatStream {
    /// Create a sender/stream pair backed by a bounded channel
    pub fn channel(buffer: usize) -> (ChatStreamSender, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (ChatStreamSender { sender: tx }, Self { receiver: rx })
    }

    /// Drain the stream, returning every event in emission order.
    /// Used by the non-streaming stage endpoints and by tests.
    pub async fn collect_events(mut self) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.receiver.recv().await {
            events.push(event);
        }
        events
    }

    /// Drain the stream and return the terminal result, if one was emitted
    pub async fn into_result(self) -> Option<ChatResult> {
        self.collect_events()
            .await
            .into_iter()
            .find_map(|event| match event {
                ChatEvent::Complete { result } => Some(result),
                _ => None,
            })
    }
}

impl Stream for ChatStream {
    type Item = ChatEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

/// Sender half used by the coordinator while a turn runs
#[derive(Clone)]
pub struct ChatStreamSender {
    sender: mpsc::Sender<ChatEvent>,
}

impl ChatStreamSender {
    /// Send an event; returns false when the receiver is gone
    /// (client disconnected), which callers treat as a cancel signal.
    pub async fn send(&self, event: ChatEvent) -> bool {
        self.sender.send(event).await.is_ok()
    }

    pub async fn progress(&self, agent: &str, message: impl Into<String>) -> bool {
        self.send(ChatEvent::progress(agent, message)).await
    }

    pub async fn error(&self, agent: &str, message: impl Into<String>) -> bool {
        self.send(ChatEvent::error(agent, message)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_event_wire_format() {
        let event = ChatEvent::progress("scoping", "Gathering requirements");
        let line = serde_json::to_string(&event).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["type"], "progress");
        assert_eq!(value["agent"], "scoping");
        assert_eq!(value["message"], "Gathering requirements");
    }

    #[test]
    fn complete_event_carries_result() {
        let event = ChatEvent::complete(ChatResult::reply(Requirements::default(), "hi"));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "complete");
        assert_eq!(value["result"]["search_summary"], "hi");
    }

    #[tokio::test]
    async fn collect_preserves_emission_order() {
        let (sender, stream) = ChatStream::channel(8);
        tokio::spawn(async move {
            sender.progress("scoping", "one").await;
            sender.progress("research", "two").await;
            sender
                .send(ChatEvent::complete(ChatResult::reply(
                    Requirements::default(),
                    "done",
                )))
                .await;
        });

        let events = stream.collect_events().await;
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], ChatEvent::Progress { message, .. } if message == "one"));
        assert!(matches!(&events[1], ChatEvent::Progress { message, .. } if message == "two"));
        assert!(matches!(&events[2], ChatEvent::Complete { .. }));
    }
}
