//! Session events: the inputs of the session state machine.

use uuid::Uuid;

use super::fragments::Fragment;
use super::history::Turn;
use super::vitals::{Ending, Vitals};

/// A fully computed turn, ready to be committed to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTurn {
    /// The record appended to history.
    pub turn: Turn,
    /// Vitals after the clamped delta.
    pub vitals: Vitals,
    /// Fragments of the next turn.
    pub next_fragments: Vec<Fragment>,
    /// Set when the turn ended the session.
    pub ending: Option<Ending>,
    /// Closing narrative. A terminal turn without one gets the scenario
    /// fallback when committed.
    pub ending_text: Option<String>,
}

/// Everything that can happen to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The player left the start screen.
    GameStarted,
    /// One-shot move of a fragment.
    FragmentMoved {
        /// Source index.
        from: usize,
        /// Destination index.
        to: usize,
    },
    /// A drag gesture picked up a fragment.
    MoveBegun {
        /// Index of the picked-up fragment.
        index: usize,
    },
    /// A drag gesture hovered over a new position.
    MoveProposed {
        /// Index hovered over.
        target: usize,
    },
    /// A drag gesture ended.
    MoveCommitted,
    /// The player restored the round-start order.
    OrderReset,
    /// The player submitted the current order.
    TurnSubmitted {
        /// Identifies this submission.
        correlation_id: Uuid,
    },
    /// The oracle resolved the pending submission.
    TurnResolved {
        /// The submission being resolved.
        correlation_id: Uuid,
        /// The computed turn.
        resolution: Box<ResolvedTurn>,
    },
    /// The oracle failed; the pending submission is rolled back.
    TurnFailed {
        /// The submission being rolled back.
        correlation_id: Uuid,
        /// Why the oracle failed.
        reason: String,
    },
    /// The whole session goes back to its scenario's start.
    SessionReset,
}

impl SessionEvent {
    /// The event type name, for logging.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::GameStarted => "session.game_started",
            Self::FragmentMoved { .. } => "session.fragment_moved",
            Self::MoveBegun { .. } => "session.move_begun",
            Self::MoveProposed { .. } => "session.move_proposed",
            Self::MoveCommitted => "session.move_committed",
            Self::OrderReset => "session.order_reset",
            Self::TurnSubmitted { .. } => "session.turn_submitted",
            Self::TurnResolved { .. } => "session.turn_resolved",
            Self::TurnFailed { .. } => "session.turn_failed",
            Self::SessionReset => "session.reset",
        }
    }
}
