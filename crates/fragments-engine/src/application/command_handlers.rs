//! Command handlers for the session context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load the session, apply the command's event,
//! and store the result.

use std::sync::Arc;

use fragments_core::clock::Clock;
use fragments_core::command::Command;
use fragments_core::error::DomainError;
use fragments_core::oracle::NarrativeOracle;
use tracing::{debug, info};

use crate::application::repository::SessionRepository;
use crate::application::turn_controller::settle_submission;
use crate::domain::aggregates::Session;
use crate::domain::commands::{
    ApplyGesture, CreateSession, DragGesture, MoveFragment, ResetOrder, ResetSession, StartGame,
    SubmitTurn,
};
use crate::domain::events::SessionEvent;
use crate::domain::scenario::Scenario;

async fn apply_event(
    command: &dyn Command,
    event: SessionEvent,
    repo: &dyn SessionRepository,
) -> Result<Session, DomainError> {
    let event_type = event.event_type();
    let session = repo.transition(command.session_id(), event).await?;
    debug!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        event_type,
        status = session.status().as_str(),
        "applied session event"
    );
    Ok(session)
}

/// Handles the `CreateSession` command: builds a fresh session from the
/// scenario and stores it.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the id is already taken.
pub async fn handle_create_session(
    command: &CreateSession,
    scenario: Arc<Scenario>,
    repo: &dyn SessionRepository,
) -> Result<Session, DomainError> {
    let session = Session::new(command.session_id, scenario);
    repo.insert(session.clone()).await?;
    info!(session_id = %session.id, correlation_id = %command.correlation_id, "session created");
    Ok(session)
}

/// Handles the `StartGame` command.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if the session does not exist.
pub async fn handle_start_game(
    command: &StartGame,
    repo: &dyn SessionRepository,
) -> Result<Session, DomainError> {
    apply_event(command, SessionEvent::GameStarted, repo).await
}

/// Handles the `MoveFragment` command. Rejected moves return the session
/// unchanged.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if the session does not exist.
pub async fn handle_move_fragment(
    command: &MoveFragment,
    repo: &dyn SessionRepository,
) -> Result<Session, DomainError> {
    let current = repo.load(command.session_id).await?;
    if !current.fragments().can_move(command.from, command.to) {
        debug!(
            session_id = %command.session_id,
            from = command.from,
            to = command.to,
            "move rejected"
        );
        return Ok(current);
    }

    let event = SessionEvent::FragmentMoved {
        from: command.from,
        to: command.to,
    };
    apply_event(command, event, repo).await
}

/// Handles the `ApplyGesture` command.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if the session does not exist.
pub async fn handle_apply_gesture(
    command: &ApplyGesture,
    repo: &dyn SessionRepository,
) -> Result<Session, DomainError> {
    let event = match command.gesture {
        DragGesture::Begin { index } => SessionEvent::MoveBegun { index },
        DragGesture::Propose { target } => SessionEvent::MoveProposed { target },
        DragGesture::Commit => SessionEvent::MoveCommitted,
    };
    apply_event(command, event, repo).await
}

/// Handles the `ResetOrder` command.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if the session does not exist.
pub async fn handle_reset_order(
    command: &ResetOrder,
    repo: &dyn SessionRepository,
) -> Result<Session, DomainError> {
    apply_event(command, SessionEvent::OrderReset, repo).await
}

/// Handles the `ResetSession` command.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if the session does not exist.
pub async fn handle_reset_session(
    command: &ResetSession,
    repo: &dyn SessionRepository,
) -> Result<Session, DomainError> {
    let session = apply_event(command, SessionEvent::SessionReset, repo).await?;
    info!(session_id = %session.id, "session reset");
    Ok(session)
}

/// Handles the `SubmitTurn` command: moves the session to `loading`, consults
/// the oracle without holding the repository, then commits the turn or rolls
/// it back. A submission made while the session is not `playing` is ignored
/// and the session is returned unchanged.
///
/// Once the session is `loading`, settlement runs on its own task and always
/// completes, even if the returned future is dropped.
///
/// Oracle failures are not errors here; they surface as the session's
/// notice.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if the session does not exist, and
/// `DomainError::Infrastructure` if the settlement task panics.
pub async fn handle_submit_turn(
    command: &SubmitTurn,
    oracle: Arc<dyn NarrativeOracle>,
    clock: Arc<dyn Clock>,
    repo: Arc<dyn SessionRepository>,
) -> Result<Session, DomainError> {
    let correlation_id = command.correlation_id;
    let loading = apply_event(
        command,
        SessionEvent::TurnSubmitted { correlation_id },
        repo.as_ref(),
    )
    .await?;
    if !loading.is_pending(correlation_id) {
        debug!(
            session_id = %loading.id,
            status = loading.status().as_str(),
            "submission ignored"
        );
        return Ok(loading);
    }

    let command = command.clone();
    let settlement = tokio::spawn(async move {
        let event =
            settle_submission(&loading, correlation_id, oracle.as_ref(), clock.as_ref()).await;
        apply_event(&command, event, repo.as_ref()).await
    });
    settlement
        .await
        .map_err(|e| DomainError::Infrastructure(format!("turn settlement task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use fragments_core::clock::Clock;
    use fragments_core::error::DomainError;
    use fragments_core::oracle::{
        EndingRequest, NarrativeOracle, ProposedFragment, TurnRequest, TurnResponse, VitalsMap,
    };
    use fragments_test_support::{FailingOracle, FixedClock, ScriptedOracle};
    use tokio::sync::Notify;
    use uuid::Uuid;

    use crate::application::command_handlers::{
        handle_apply_gesture, handle_create_session, handle_move_fragment, handle_reset_order,
        handle_reset_session, handle_start_game, handle_submit_turn,
    };
    use crate::application::repository::{InMemorySessionRepository, SessionRepository};
    use crate::domain::aggregates::SessionStatus;
    use crate::domain::commands::{
        ApplyGesture, CreateSession, DragGesture, MoveFragment, ResetOrder, ResetSession,
        StartGame, SubmitTurn,
    };
    use crate::domain::events::SessionEvent;
    use crate::domain::scenario::Scenario;

    async fn started(repo: &InMemorySessionRepository) -> Uuid {
        let session_id = Uuid::new_v4();
        handle_create_session(
            &CreateSession {
                correlation_id: Uuid::new_v4(),
                session_id,
            },
            Arc::new(Scenario::default()),
            repo,
        )
        .await
        .unwrap();
        handle_start_game(
            &StartGame {
                correlation_id: Uuid::new_v4(),
                session_id,
            },
            repo,
        )
        .await
        .unwrap();
        session_id
    }

    /// Holds every turn call until the gate is opened.
    struct GatedOracle {
        gate: Arc<Notify>,
        inner: ScriptedOracle,
    }

    #[async_trait]
    impl NarrativeOracle for GatedOracle {
        async fn resolve_turn(&self, request: &TurnRequest) -> Result<TurnResponse, DomainError> {
            self.gate.notified().await;
            self.inner.resolve_turn(request).await
        }

        async fn resolve_ending(&self, request: &EndingRequest) -> Result<String, DomainError> {
            self.inner.resolve_ending(request).await
        }
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::default())
    }

    fn submit(session_id: Uuid) -> SubmitTurn {
        SubmitTurn {
            correlation_id: Uuid::new_v4(),
            session_id,
        }
    }

    fn response(change: i32) -> TurnResponse {
        TurnResponse {
            vitals_delta: VitalsMap::from([("happiness".to_owned(), change)]),
            interpretation: "She laughs at herself.".to_owned(),
            next_fragments: vec![
                ProposedFragment::undesignated("Coffee, then."),
                ProposedFragment::undesignated("The window is just a window."),
            ],
            ..TurnResponse::default()
        }
    }

    #[tokio::test]
    async fn test_handle_create_session_stores_session_in_start() {
        // Arrange
        let repo = Arc::new(InMemorySessionRepository::new());
        let session_id = Uuid::new_v4();
        let command = CreateSession {
            correlation_id: Uuid::new_v4(),
            session_id,
        };

        // Act
        let session = handle_create_session(&command, Arc::new(Scenario::default()), &*repo)
            .await
            .unwrap();

        // Assert
        assert_eq!(session.status(), &SessionStatus::Start);
        assert_eq!(repo.load(session_id).await.unwrap(), session);
    }

    #[tokio::test]
    async fn test_handle_move_fragment_and_reset_order() {
        // Arrange
        let repo = Arc::new(InMemorySessionRepository::new());
        let session_id = started(&repo).await;

        // Act
        let moved = handle_move_fragment(
            &MoveFragment {
                correlation_id: Uuid::new_v4(),
                session_id,
                from: 3,
                to: 2,
            },
            &*repo,
        )
        .await
        .unwrap();
        let reset = handle_reset_order(
            &ResetOrder {
                correlation_id: Uuid::new_v4(),
                session_id,
            },
            &*repo,
        )
        .await
        .unwrap();

        // Assert
        assert!(moved.fragments().is_order_changed());
        assert_eq!(moved.fragments().fragments()[2].text, "Maybe he's just busy.");
        assert!(!reset.fragments().is_order_changed());
    }

    #[tokio::test]
    async fn test_handle_apply_gesture_drags_fragment() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let session_id = started(&repo).await;
        let gesture = |gesture| ApplyGesture {
            correlation_id: Uuid::new_v4(),
            session_id,
            gesture,
        };

        handle_apply_gesture(&gesture(DragGesture::Begin { index: 3 }), &*repo)
            .await
            .unwrap();
        let dragging = handle_apply_gesture(&gesture(DragGesture::Propose { target: 2 }), &*repo)
            .await
            .unwrap();
        let dropped = handle_apply_gesture(&gesture(DragGesture::Commit), &*repo)
            .await
            .unwrap();

        assert_eq!(dragging.fragments().dragging(), Some(2));
        assert_eq!(dropped.fragments().dragging(), None);
        assert_eq!(dropped.fragments().fragments()[2].text, "Maybe he's just busy.");
    }

    #[tokio::test]
    async fn test_handle_submit_turn_commits_turn() {
        // Arrange
        let repo = Arc::new(InMemorySessionRepository::new());
        let session_id = started(&repo).await;
        let oracle = Arc::new(ScriptedOracle::new().with_turn(response(15)));

        // Act
        let session = handle_submit_turn(&submit(session_id), oracle.clone(), clock(), repo.clone())
            .await
            .unwrap();

        // Assert
        assert_eq!(session.status(), &SessionStatus::Playing);
        assert_eq!(session.vitals().get("happiness"), Some(65));
        assert_eq!(session.history().len(), 1);
        assert!(session.fragments().fragments()[0].is_anchored());
        assert!(!session.fragments().fragments()[1].is_anchored());
        assert_eq!(repo.load(session_id).await.unwrap(), session);
    }

    #[tokio::test]
    async fn test_handle_submit_turn_rolls_back_on_oracle_failure() {
        // Arrange
        let repo = Arc::new(InMemorySessionRepository::new());
        let session_id = started(&repo).await;
        let before = repo.load(session_id).await.unwrap();

        // Act
        let session = handle_submit_turn(
            &submit(session_id),
            Arc::new(FailingOracle),
            clock(),
            repo.clone(),
        )
        .await
        .unwrap();

        // Assert
        assert_eq!(session.status(), &SessionStatus::Playing);
        assert_eq!(session.vitals(), before.vitals());
        assert_eq!(session.fragments(), before.fragments());
        assert_eq!(session.history(), before.history());
        assert!(session.notice().is_some());
    }

    #[tokio::test]
    async fn test_handle_submit_turn_before_start_is_ignored() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let session_id = Uuid::new_v4();
        handle_create_session(
            &CreateSession {
                correlation_id: Uuid::new_v4(),
                session_id,
            },
            Arc::new(Scenario::default()),
            &*repo,
        )
        .await
        .unwrap();
        let oracle = Arc::new(ScriptedOracle::new().with_turn(response(15)));

        let session = handle_submit_turn(&submit(session_id), oracle.clone(), clock(), repo.clone())
            .await
            .unwrap();

        assert_eq!(session.status(), &SessionStatus::Start);
        assert!(oracle.turn_requests().is_empty());
    }

    #[tokio::test]
    async fn test_second_submission_while_loading_is_ignored() {
        // Arrange
        let repo = Arc::new(InMemorySessionRepository::new());
        let session_id = started(&repo).await;
        let first = Uuid::new_v4();
        repo.transition(session_id, SessionEvent::TurnSubmitted { correlation_id: first })
            .await
            .unwrap();
        let oracle = Arc::new(ScriptedOracle::new().with_turn(response(15)));

        // Act
        let session = handle_submit_turn(&submit(session_id), oracle.clone(), clock(), repo.clone())
            .await
            .unwrap();

        // Assert
        assert_eq!(session.status(), &SessionStatus::Loading);
        assert!(session.is_pending(first));
        assert!(oracle.turn_requests().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_submission_still_settles() {
        // Arrange
        let repo = Arc::new(InMemorySessionRepository::new());
        let session_id = started(&repo).await;
        let gate = Arc::new(Notify::new());
        let oracle = Arc::new(GatedOracle {
            gate: gate.clone(),
            inner: ScriptedOracle::new().with_turn(response(15)),
        });

        // Act: the caller gives up while the oracle is still thinking.
        let abandoned = tokio::time::timeout(
            Duration::from_millis(20),
            handle_submit_turn(&submit(session_id), oracle, clock(), repo.clone()),
        )
        .await;
        gate.notify_one();
        let mut settled = repo.load(session_id).await.unwrap();
        for _ in 0..200 {
            if settled.status() != &SessionStatus::Loading {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            settled = repo.load(session_id).await.unwrap();
        }
        let retried = handle_submit_turn(
            &submit(session_id),
            Arc::new(FailingOracle),
            clock(),
            repo.clone(),
        )
        .await
        .unwrap();

        // Assert
        assert!(abandoned.is_err());
        assert_eq!(settled.status(), &SessionStatus::Playing);
        assert_eq!(settled.history().len(), 1);
        assert_eq!(settled.vitals().get("happiness"), Some(65));
        assert_eq!(retried.status(), &SessionStatus::Playing);
        assert!(retried.notice().is_some());
        assert_eq!(retried.history().len(), 1);
    }

    #[tokio::test]
    async fn test_handle_reset_session_clears_history() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let session_id = started(&repo).await;
        let oracle = Arc::new(ScriptedOracle::new().with_turn(response(15)));
        handle_submit_turn(&submit(session_id), oracle.clone(), clock(), repo.clone())
            .await
            .unwrap();

        let session = handle_reset_session(
            &ResetSession {
                correlation_id: Uuid::new_v4(),
                session_id,
            },
            &*repo,
        )
        .await
        .unwrap();

        assert_eq!(session.status(), &SessionStatus::Start);
        assert!(session.history().is_empty());
        assert_eq!(session.vitals().get("happiness"), Some(50));
    }

    #[tokio::test]
    async fn test_handlers_report_unknown_session() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let session_id = Uuid::new_v4();

        let result = handle_start_game(
            &StartGame {
                correlation_id: Uuid::new_v4(),
                session_id,
            },
            &*repo,
        )
        .await;

        assert_eq!(result.unwrap_err(), DomainError::SessionNotFound(session_id));
    }
}
