//! Session repository.
//!
//! Sessions live only in memory. The repository applies events atomically,
//! so two concurrent submissions cannot both observe `playing`.

use std::collections::HashMap;

use async_trait::async_trait;
use fragments_core::error::DomainError;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::aggregates::Session;
use crate::domain::events::SessionEvent;

/// Storage for live sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Stores a new session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a session with the same id exists.
    async fn insert(&self, session: Session) -> Result<(), DomainError>;

    /// Returns a copy of a session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionNotFound` if the id is unknown.
    async fn load(&self, session_id: Uuid) -> Result<Session, DomainError>;

    /// Applies `event` to a session and returns the result, as one atomic
    /// step.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionNotFound` if the id is unknown.
    async fn transition(&self, session_id: Uuid, event: SessionEvent)
    -> Result<Session, DomainError>;
}

/// Process-local session storage.
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl InMemorySessionRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn insert(&self, session: Session) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.id) {
            return Err(DomainError::Validation(format!(
                "session already exists: {}",
                session.id
            )));
        }
        sessions.insert(session.id, session);
        Ok(())
    }

    async fn load(&self, session_id: Uuid) -> Result<Session, DomainError> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .cloned()
            .ok_or(DomainError::SessionNotFound(session_id))
    }

    async fn transition(
        &self,
        session_id: Uuid,
        event: SessionEvent,
    ) -> Result<Session, DomainError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .remove(&session_id)
            .ok_or(DomainError::SessionNotFound(session_id))?;
        let next = session.apply(event);
        sessions.insert(session_id, next.clone());
        Ok(next)
    }
}
