//! History log of completed turns.

use chrono::{DateTime, Utc};
use fragments_core::oracle::{TurnSummary, VitalsMap};
use serde::Serialize;

use super::vitals::Vitals;

/// One resolved turn. Immutable once it is in the [`History`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    /// One-based turn number.
    pub turn_id: u32,
    /// Fragment texts in the order the player submitted them.
    pub submitted_sequence: Vec<String>,
    /// The oracle's interpretation of the order.
    pub interpretation: String,
    /// Delta as returned by the oracle, before clamping.
    pub delta: VitalsMap,
    /// Vitals after the clamped delta was applied.
    pub resulting_vitals: Vitals,
    /// Emotional tone reported by the oracle.
    pub tone: Option<String>,
    /// When the turn was resolved.
    pub resolved_at: DateTime<Utc>,
}

impl From<&Turn> for TurnSummary {
    fn from(turn: &Turn) -> Self {
        Self {
            turn_id: turn.turn_id,
            sequence: turn.submitted_sequence.clone(),
            interpretation: turn.interpretation.clone(),
            delta: turn.delta.clone(),
            resulting_vitals: turn.resulting_vitals.as_map().clone(),
        }
    }
}

/// Append-only log of turns, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All turns, oldest first.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of completed turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` before the first turn resolves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The newest turn.
    #[must_use]
    pub fn latest(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Up to `count` newest turns, oldest first.
    #[must_use]
    pub fn recent(&self, count: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(count);
        &self.turns[start..]
    }

    /// The id the next appended turn will carry.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn next_turn_id(&self) -> u32 {
        self.turns.len() as u32 + 1
    }

    pub(crate) fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }
}
