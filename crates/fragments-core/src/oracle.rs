//! Narrative oracle contract.
//!
//! The oracle is the external collaborator that interprets a submitted
//! fragment order. The engine talks to it only through [`NarrativeOracle`];
//! how a concrete oracle builds prompts or encodes requests on the wire is
//! its own business.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Track name to value, ordered by track name.
pub type VitalsMap = BTreeMap<String, i32>;

/// Everything the oracle needs to interpret one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRequest {
    /// Fragment texts in the order the player submitted them.
    pub ordered_fragments: Vec<String>,
    /// Vitals before the turn is applied.
    pub current_vitals: VitalsMap,
    /// Free-form scenario context for the oracle, if any.
    pub turn_context: Option<String>,
}

/// A fragment proposed for the next turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedFragment {
    /// Fragment text.
    pub text: String,
    /// Whether the fragment is anchored. `None` when the oracle did not say.
    #[serde(default)]
    pub anchored: Option<bool>,
}

impl ProposedFragment {
    /// Creates a fragment with an explicit anchor designation.
    #[must_use]
    pub fn new(text: impl Into<String>, anchored: bool) -> Self {
        Self {
            text: text.into(),
            anchored: Some(anchored),
        }
    }

    /// Creates a fragment whose anchor designation was omitted.
    #[must_use]
    pub fn undesignated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            anchored: None,
        }
    }
}

/// The oracle's answer to a [`TurnRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurnResponse {
    /// Per-track change. Tracks not listed are unchanged.
    #[serde(default)]
    pub vitals_delta: VitalsMap,
    /// How the oracle read the submitted order.
    pub interpretation: String,
    /// Fragments for the next turn.
    #[serde(default)]
    pub next_fragments: Vec<ProposedFragment>,
    /// Explicit game-over signal, honored by the external-flag policy.
    #[serde(default)]
    pub is_game_over: Option<bool>,
    /// Ending tag accompanying `is_game_over`.
    #[serde(default)]
    pub ending_kind: Option<String>,
    /// Ending narrative, when the oracle embeds it in the turn answer.
    #[serde(default)]
    pub ending_text: Option<String>,
    /// Emotional tone of the interpretation.
    #[serde(default)]
    pub tone: Option<String>,
}

/// Condensed record of a completed turn, sent along with ending requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    /// One-based turn number.
    pub turn_id: u32,
    /// Submitted fragment texts.
    pub sequence: Vec<String>,
    /// The oracle's interpretation.
    pub interpretation: String,
    /// Delta as returned by the oracle.
    pub delta: VitalsMap,
    /// Vitals after clamping.
    pub resulting_vitals: VitalsMap,
}

/// Request for the closing narrative of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndingRequest {
    /// Whether the session ended in victory.
    pub is_victory: bool,
    /// Ending tag (`victory`, `failure`, or a scripted kind).
    pub ending_kind: String,
    /// The most recent turns, oldest first.
    pub recent_history: Vec<TurnSummary>,
    /// Scenario-provided direction for this ending, if any.
    pub directions: Option<String>,
}

/// The narrative oracle collaborator.
#[async_trait]
pub trait NarrativeOracle: Send + Sync {
    /// Interprets a submitted order and produces the consequences.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::OracleTransport` when the oracle cannot be
    /// reached and `DomainError::OracleContract` when its answer is empty or
    /// malformed.
    async fn resolve_turn(&self, request: &TurnRequest) -> Result<TurnResponse, DomainError>;

    /// Writes the closing narrative for a finished session.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`NarrativeOracle::resolve_turn`].
    async fn resolve_ending(&self, request: &EndingRequest) -> Result<String, DomainError>;
}
