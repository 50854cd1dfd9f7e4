//! Shared application state.

use std::sync::Arc;

use fragments_core::clock::Clock;
use fragments_core::oracle::NarrativeOracle;
use fragments_engine::application::repository::SessionRepository;
use fragments_engine::domain::scenario::Scenario;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Scenario every new session starts from.
    pub scenario: Arc<Scenario>,
    /// Clock used to timestamp resolved turns.
    pub clock: Arc<dyn Clock>,
    /// Narrative oracle consulted on submit.
    pub oracle: Arc<dyn NarrativeOracle>,
    /// Live sessions.
    pub sessions: Arc<dyn SessionRepository>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        scenario: Arc<Scenario>,
        clock: Arc<dyn Clock>,
        oracle: Arc<dyn NarrativeOracle>,
        sessions: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            scenario,
            clock,
            oracle,
            sessions,
        }
    }
}
