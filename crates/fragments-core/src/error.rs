//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// No session exists with the given identifier.
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    /// Invalid input or configuration (scenario, request body).
    #[error("validation error: {0}")]
    Validation(String),

    /// The narrative oracle could not be reached or returned an error status.
    #[error("oracle transport error: {0}")]
    OracleTransport(String),

    /// The narrative oracle answered, but the answer does not honor the
    /// response contract (missing fields, empty payload, unknown tracks).
    #[error("oracle contract violation: {0}")]
    OracleContract(String),

    /// An infrastructure error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Returns `true` for failures that originate in the narrative oracle.
    #[must_use]
    pub fn is_oracle_failure(&self) -> bool {
        matches!(self, Self::OracleTransport(_) | Self::OracleContract(_))
    }
}
