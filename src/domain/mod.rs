//! Core domain types shared across stages, coordinator, and relay

pub mod event;
pub mod listing;
pub mod requirements;

pub use event::{ChatEvent, ChatResult, ChatStream, ChatStreamSender};
pub use listing::{Poi, PropertyListing, TopResultCoordinates};
pub use requirements::{format_price, Requirements, RequirementsPatch};

use serde::{Deserialize, Serialize};

/// Phase of a session's conversation state machine.
///
/// `AwaitingRequirements -> Researching -> Complete`; the transition into
/// `Researching` fires only once the requirements record is complete.
/// General questions are answered without leaving `AwaitingRequirements`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    AwaitingRequirements,
    Researching,
    Complete,
}
