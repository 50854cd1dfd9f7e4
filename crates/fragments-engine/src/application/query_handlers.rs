//! Query handlers for the session context.
//!
//! This module contains query handlers that load sessions and return
//! read-only view DTOs.

use chrono::{DateTime, Utc};
use fragments_core::error::DomainError;
use fragments_core::oracle::VitalsMap;
use serde::Serialize;
use uuid::Uuid;

use crate::application::repository::SessionRepository;
use crate::domain::aggregates::Session;
use crate::domain::history::Turn;

/// A fragment as the player sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentView {
    /// The fragment text.
    pub text: String,
    /// Whether the fragment is locked in place.
    pub anchored: bool,
}

/// Read-only view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    /// The session identifier.
    pub session_id: Uuid,
    /// Scenario title.
    pub title: String,
    /// Lifecycle status: `start`, `playing`, `loading`, `victory`,
    /// `failure` or `ended`.
    pub status: String,
    /// Set once the session has ended.
    pub ending_kind: Option<String>,
    /// Fragments in their current order.
    pub fragments: Vec<FragmentView>,
    /// Whether the order differs from the start of the turn.
    pub can_reset_order: bool,
    /// Index of the fragment being dragged, if any.
    pub dragging: Option<usize>,
    /// Current vitals.
    pub vitals: VitalsMap,
    /// Number of resolved turns.
    pub turn_count: usize,
    /// Interpretation of the last resolved turn.
    pub last_interpretation: Option<String>,
    /// Tone of the last resolved turn.
    pub tone: Option<String>,
    /// Ending narrative, once ended.
    pub ending_text: Option<String>,
    /// Notice shown after a failed submission.
    pub notice: Option<String>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        let fragments = session.fragments();
        Self {
            session_id: session.id,
            title: session.scenario().title.clone(),
            status: session.status().as_str().to_owned(),
            ending_kind: session.status().ending_kind().map(str::to_owned),
            fragments: fragments
                .fragments()
                .iter()
                .map(|f| FragmentView {
                    text: f.text.clone(),
                    anchored: f.is_anchored(),
                })
                .collect(),
            can_reset_order: fragments.is_order_changed(),
            dragging: fragments.dragging(),
            vitals: session.vitals().as_map().clone(),
            turn_count: session.history().len(),
            last_interpretation: session.last_interpretation().map(str::to_owned),
            tone: session.tone().map(str::to_owned),
            ending_text: session.ending_text().map(str::to_owned),
            notice: session.notice().map(str::to_owned),
        }
    }
}

/// One resolved turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnView {
    /// Sequential turn number, starting at 1.
    pub turn_id: u32,
    /// The order the player submitted.
    pub submitted_sequence: Vec<String>,
    /// The oracle's reading of the order.
    pub interpretation: String,
    /// Per-track change requested by the oracle.
    pub delta: VitalsMap,
    /// Vitals after clamping.
    pub resulting_vitals: VitalsMap,
    /// Tone, when provided.
    pub tone: Option<String>,
    /// When the turn was committed.
    pub resolved_at: DateTime<Utc>,
}

impl From<&Turn> for TurnView {
    fn from(turn: &Turn) -> Self {
        Self {
            turn_id: turn.turn_id,
            submitted_sequence: turn.submitted_sequence.clone(),
            interpretation: turn.interpretation.clone(),
            delta: turn.delta.clone(),
            resulting_vitals: turn.resulting_vitals.as_map().clone(),
            tone: turn.tone.clone(),
            resolved_at: turn.resolved_at,
        }
    }
}

/// Read-only view of a session's history, oldest turn first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryView {
    /// The session identifier.
    pub session_id: Uuid,
    /// Resolved turns in order.
    pub turns: Vec<TurnView>,
}

/// Retrieves a session by its ID.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if the session does not exist.
pub async fn get_session_by_id(
    session_id: Uuid,
    repo: &dyn SessionRepository,
) -> Result<SessionView, DomainError> {
    let session = repo.load(session_id).await?;
    Ok(SessionView::from(&session))
}

/// Retrieves the resolved turns of a session.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if the session does not exist.
pub async fn get_history(
    session_id: Uuid,
    repo: &dyn SessionRepository,
) -> Result<HistoryView, DomainError> {
    let session = repo.load(session_id).await?;
    Ok(HistoryView {
        session_id,
        turns: session.history().turns().iter().map(TurnView::from).collect(),
    })
}
