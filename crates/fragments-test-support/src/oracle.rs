//! Test oracles — mock `NarrativeOracle` implementations for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use fragments_core::error::DomainError;
use fragments_core::oracle::{EndingRequest, NarrativeOracle, TurnRequest, TurnResponse};

/// An oracle that replays scripted answers in order and records every request
/// it receives. Once a script runs dry, further calls fail with a transport
/// error.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    turns: Mutex<VecDeque<Result<TurnResponse, DomainError>>>,
    endings: Mutex<VecDeque<Result<String, DomainError>>>,
    turn_requests: Mutex<Vec<TurnRequest>>,
    ending_requests: Mutex<Vec<EndingRequest>>,
}

impl ScriptedOracle {
    /// Creates an oracle with empty scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful turn answer.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_turn(self, response: TurnResponse) -> Self {
        self.turns.lock().unwrap().push_back(Ok(response));
        self
    }

    /// Queues a failed turn answer.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_turn_error(self, error: DomainError) -> Self {
        self.turns.lock().unwrap().push_back(Err(error));
        self
    }

    /// Queues a successful ending answer.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_ending(self, text: impl Into<String>) -> Self {
        self.endings.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    /// Queues a failed ending answer.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_ending_error(self, error: DomainError) -> Self {
        self.endings.lock().unwrap().push_back(Err(error));
        self
    }

    /// Returns a snapshot of all turn requests received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn turn_requests(&self) -> Vec<TurnRequest> {
        self.turn_requests.lock().unwrap().clone()
    }

    /// Returns a snapshot of all ending requests received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn ending_requests(&self) -> Vec<EndingRequest> {
        self.ending_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl NarrativeOracle for ScriptedOracle {
    async fn resolve_turn(&self, request: &TurnRequest) -> Result<TurnResponse, DomainError> {
        self.turn_requests.lock().unwrap().push(request.clone());
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DomainError::OracleTransport("turn script exhausted".into())))
    }

    async fn resolve_ending(&self, request: &EndingRequest) -> Result<String, DomainError> {
        self.ending_requests.lock().unwrap().push(request.clone());
        self.endings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DomainError::OracleTransport("ending script exhausted".into())))
    }
}

/// An oracle that always fails with a transport error. Useful for testing
/// rollback paths.
#[derive(Debug)]
pub struct FailingOracle;

#[async_trait]
impl NarrativeOracle for FailingOracle {
    async fn resolve_turn(&self, _request: &TurnRequest) -> Result<TurnResponse, DomainError> {
        Err(DomainError::OracleTransport("connection refused".into()))
    }

    async fn resolve_ending(&self, _request: &EndingRequest) -> Result<String, DomainError> {
        Err(DomainError::OracleTransport("connection refused".into()))
    }
}
