//! Turn controller: drives one submission through the narrative oracle.
//!
//! The oracle calls are the only side effects in a turn. The turn call comes
//! first; the ending call follows only when the turn ended the session and
//! the oracle did not already embed an ending. Any failure of the turn call,
//! including a contract violation, becomes a `TurnFailed` event and rolls the
//! submission back. A failed ending call never does: the session falls back
//! to the scenario's fixed ending text instead.

use fragments_core::clock::Clock;
use fragments_core::error::DomainError;
use fragments_core::oracle::{EndingRequest, NarrativeOracle};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::aggregates::Session;
use crate::domain::events::{ResolvedTurn, SessionEvent};

async fn fetch_ending(oracle: &dyn NarrativeOracle, request: &EndingRequest) -> Option<String> {
    match oracle.resolve_ending(request).await {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => {
            warn!(ending_kind = %request.ending_kind, "oracle returned an empty ending, using fallback");
            None
        }
        Err(err) => {
            warn!(ending_kind = %request.ending_kind, error = %err, "ending request failed, using fallback");
            None
        }
    }
}

/// Asks the oracle to resolve the pending submission and computes the turn,
/// including its ending narrative when the turn is terminal. Nothing is
/// committed.
///
/// # Errors
///
/// Returns `DomainError::Validation` if `correlation_id` is not pending, and
/// the oracle's transport or contract error if the turn call fails.
pub async fn resolve_submission(
    session: &Session,
    correlation_id: Uuid,
    oracle: &dyn NarrativeOracle,
    clock: &dyn Clock,
) -> Result<ResolvedTurn, DomainError> {
    let request = session
        .turn_request()
        .filter(|_| session.is_pending(correlation_id))
        .ok_or_else(|| DomainError::Validation(format!("no pending submission {correlation_id}")))?;

    let response = oracle.resolve_turn(&request).await?;
    let mut resolution = session.plan_turn(correlation_id, response, clock.now())?;

    let ending_request = session
        .ending_request(&resolution)
        .filter(|_| resolution.ending_text.is_none());
    if let Some(ending_request) = ending_request {
        resolution.ending_text = fetch_ending(oracle, &ending_request).await;
    }

    Ok(resolution)
}

/// Resolves the pending submission and returns the event that settles it:
/// `TurnResolved` on success, `TurnFailed` otherwise.
pub async fn settle_submission(
    session: &Session,
    correlation_id: Uuid,
    oracle: &dyn NarrativeOracle,
    clock: &dyn Clock,
) -> SessionEvent {
    match resolve_submission(session, correlation_id, oracle, clock).await {
        Ok(resolution) => {
            info!(
                session_id = %session.id,
                %correlation_id,
                turn_id = resolution.turn.turn_id,
                ending = ?resolution.ending.as_ref().map(|e| e.kind()),
                "turn resolved"
            );
            SessionEvent::TurnResolved {
                correlation_id,
                resolution: Box::new(resolution),
            }
        }
        Err(err) => {
            if err.is_oracle_failure() {
                warn!(session_id = %session.id, %correlation_id, error = %err, "turn failed, rolling back");
            } else {
                error!(session_id = %session.id, %correlation_id, error = %err, "turn aborted, rolling back");
            }
            SessionEvent::TurnFailed {
                correlation_id,
                reason: err.to_string(),
            }
        }
    }
}

/// Plays one full turn on a session value: submit, consult the oracle, then
/// commit or roll back. A session that is not `playing` is returned as is.
pub async fn play_turn(
    session: Session,
    correlation_id: Uuid,
    oracle: &dyn NarrativeOracle,
    clock: &dyn Clock,
) -> Session {
    let session = session.apply(SessionEvent::TurnSubmitted { correlation_id });
    if !session.is_pending(correlation_id) {
        return session;
    }
    let event = settle_submission(&session, correlation_id, oracle, clock).await;
    session.apply(event)
}
