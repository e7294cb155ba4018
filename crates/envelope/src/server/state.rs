//! Shared application state injected into every Axum handler.

use crate::engine::EnvelopeEngine;

/// Application state shared across all request handlers.
///
/// [`EnvelopeEngine`] is `Arc`-backed, so Axum can clone the state for each
/// request without copying key-service clients.
#[derive(Clone, Debug)]
pub struct AppState {
    /// The envelope engine every endpoint delegates to.
    pub engine: EnvelopeEngine,
}

impl AppState {
    /// Create a new [`AppState`] around `engine`.
    pub fn new(engine: EnvelopeEngine) -> Self {
        Self { engine }
    }
}
