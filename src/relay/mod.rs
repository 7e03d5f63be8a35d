//! HTTP surface: the streaming chat relay, the internal stage endpoints,
//! session inspection, and health checks

pub mod chat;
pub mod health;
pub mod sessions;
pub mod stages;

use std::sync::Arc;

use crate::agents::geo::Geocoder;
use crate::agents::Coordinator;

/// Shared state behind the relay routes
#[derive(Clone)]
pub struct RelayState {
    pub coordinator: Arc<Coordinator>,
    /// Present only when a geocoding token is configured
    pub geocoder: Option<Arc<dyn Geocoder>>,
}
