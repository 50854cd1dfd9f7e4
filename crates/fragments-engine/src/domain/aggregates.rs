//! The session aggregate and its state machine.
//!
//! A [`Session`] is a plain value. Every transition goes through
//! [`Session::apply`], which consumes the session and returns its successor;
//! events that are not valid in the current status leave it unchanged.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fragments_core::error::DomainError;
use fragments_core::oracle::{EndingRequest, TurnRequest, TurnResponse, TurnSummary};
use uuid::Uuid;

use super::events::{ResolvedTurn, SessionEvent};
use super::fragments::{FragmentStore, fragments_from_proposed};
use super::history::{History, Turn};
use super::scenario::Scenario;
use super::vitals::{Ending, Vitals, apply_delta, evaluate_terminal, validate_delta};

/// How many of the newest turns accompany an ending request.
pub const ENDING_HISTORY_WINDOW: usize = 3;

/// Lifecycle status of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Created or reset; the game has not begun.
    Start,
    /// Waiting for the player.
    Playing,
    /// A submission is with the oracle.
    Loading,
    /// Ended in victory.
    Victory,
    /// Ended in failure.
    Failure,
    /// Ended in a scripted ending.
    Ended(String),
}

impl SessionStatus {
    /// Status name, with all scripted endings reported as `ended`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::Playing => "playing",
            Self::Loading => "loading",
            Self::Victory => "victory",
            Self::Failure => "failure",
            Self::Ended(_) => "ended",
        }
    }

    /// Returns `true` once gameplay is over.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Victory | Self::Failure | Self::Ended(_))
    }

    /// The ending tag for terminal statuses.
    #[must_use]
    pub fn ending_kind(&self) -> Option<&str> {
        match self {
            Self::Victory => Some("victory"),
            Self::Failure => Some("failure"),
            Self::Ended(kind) => Some(kind),
            _ => None,
        }
    }
}

impl From<&Ending> for SessionStatus {
    fn from(ending: &Ending) -> Self {
        match ending {
            Ending::Victory => Self::Victory,
            Ending::Failure => Self::Failure,
            Ending::Scripted(kind) => Self::Ended(kind.clone()),
        }
    }
}

/// The submission currently with the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    /// Identifies the submission.
    pub correlation_id: Uuid,
    /// Fragment texts in submitted order.
    pub submitted_sequence: Vec<String>,
}

/// The aggregate root for one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Aggregate identifier. Survives resets.
    pub id: Uuid,
    scenario: Arc<Scenario>,
    status: SessionStatus,
    fragments: FragmentStore,
    vitals: Vitals,
    history: History,
    pending: Option<PendingTurn>,
    last_interpretation: Option<String>,
    tone: Option<String>,
    ending_text: Option<String>,
    notice: Option<String>,
}

impl Session {
    /// Creates a session in `start` status with the scenario's initial
    /// fragments and vitals.
    #[must_use]
    pub fn new(id: Uuid, scenario: Arc<Scenario>) -> Self {
        Self {
            id,
            status: SessionStatus::Start,
            fragments: FragmentStore::new(scenario.initial_fragments.clone()),
            vitals: scenario.vitals.initial_vitals(),
            history: History::new(),
            pending: None,
            last_interpretation: None,
            tone: None,
            ending_text: None,
            notice: None,
            scenario,
        }
    }

    /// The scenario this session was created from.
    #[must_use]
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    /// The current turn's fragments.
    #[must_use]
    pub fn fragments(&self) -> &FragmentStore {
        &self.fragments
    }

    /// Current vitals.
    #[must_use]
    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    /// Completed turns.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The submission with the oracle, while `loading`.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingTurn> {
        self.pending.as_ref()
    }

    /// Interpretation of the newest turn.
    #[must_use]
    pub fn last_interpretation(&self) -> Option<&str> {
        self.last_interpretation.as_deref()
    }

    /// Tone of the newest turn.
    #[must_use]
    pub fn tone(&self) -> Option<&str> {
        self.tone.as_deref()
    }

    /// Closing narrative, once the session has ended.
    #[must_use]
    pub fn ending_text(&self) -> Option<&str> {
        self.ending_text.as_deref()
    }

    /// User-visible notice left by the last rolled-back submission.
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Returns `true` if `correlation_id` identifies the pending submission.
    #[must_use]
    pub fn is_pending(&self, correlation_id: Uuid) -> bool {
        self.status == SessionStatus::Loading
            && self
                .pending
                .as_ref()
                .is_some_and(|p| p.correlation_id == correlation_id)
    }

    /// The oracle request for the pending submission.
    #[must_use]
    pub fn turn_request(&self) -> Option<TurnRequest> {
        let pending = self.pending.as_ref()?;
        Some(TurnRequest {
            ordered_fragments: pending.submitted_sequence.clone(),
            current_vitals: self.vitals.as_map().clone(),
            turn_context: self.scenario.turn_context.clone(),
        })
    }

    /// Computes the turn the oracle's `response` describes, without
    /// committing it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `correlation_id` is not the
    /// pending submission, and `DomainError::OracleContract` if the response
    /// has no interpretation, names an unknown track, contains a blank
    /// fragment, or leaves a non-terminal session without fragments.
    pub fn plan_turn(
        &self,
        correlation_id: Uuid,
        response: TurnResponse,
        resolved_at: DateTime<Utc>,
    ) -> Result<ResolvedTurn, DomainError> {
        let pending = self
            .pending
            .as_ref()
            .filter(|_| self.is_pending(correlation_id))
            .ok_or_else(|| {
                DomainError::Validation(format!("no pending submission {correlation_id}"))
            })?;

        let interpretation = response.interpretation.trim();
        if interpretation.is_empty() {
            return Err(DomainError::OracleContract(
                "response has no interpretation".to_owned(),
            ));
        }
        validate_delta(&response.vitals_delta, &self.scenario.vitals)?;
        if response
            .next_fragments
            .iter()
            .any(|f| f.text.trim().is_empty())
        {
            return Err(DomainError::OracleContract(
                "response contains a blank fragment".to_owned(),
            ));
        }

        let vitals = apply_delta(&self.vitals, &response.vitals_delta, &self.scenario.vitals);
        let ending = evaluate_terminal(
            &vitals,
            &self.scenario.vitals.terminal,
            response.is_game_over,
            response.ending_kind.as_deref(),
        );
        if ending.is_none() && response.next_fragments.is_empty() {
            return Err(DomainError::OracleContract(
                "response has no fragments for the next turn".to_owned(),
            ));
        }

        let turn = Turn {
            turn_id: self.history.next_turn_id(),
            submitted_sequence: pending.submitted_sequence.clone(),
            interpretation: interpretation.to_owned(),
            delta: response.vitals_delta.clone(),
            resulting_vitals: vitals.clone(),
            tone: response.tone.filter(|t| !t.trim().is_empty()),
            resolved_at,
        };

        Ok(ResolvedTurn {
            turn,
            vitals,
            next_fragments: fragments_from_proposed(&response.next_fragments),
            ending,
            ending_text: response.ending_text.filter(|t| !t.trim().is_empty()),
        })
    }

    /// The request for the closing narrative of a terminal `resolution`.
    /// Returns `None` if the resolution does not end the session.
    #[must_use]
    pub fn ending_request(&self, resolution: &ResolvedTurn) -> Option<EndingRequest> {
        let ending = resolution.ending.as_ref()?;
        let mut recent_history: Vec<TurnSummary> = self
            .history
            .recent(ENDING_HISTORY_WINDOW - 1)
            .iter()
            .map(TurnSummary::from)
            .collect();
        recent_history.push(TurnSummary::from(&resolution.turn));
        Some(EndingRequest {
            is_victory: ending.is_victory(),
            ending_kind: ending.kind().to_owned(),
            recent_history,
            directions: self.scenario.endings.directions(ending).map(str::to_owned),
        })
    }

    fn is_playing(&self) -> bool {
        self.status == SessionStatus::Playing
    }

    /// Applies `event` and returns the resulting session.
    #[must_use]
    pub fn apply(mut self, event: SessionEvent) -> Self {
        match event {
            SessionEvent::GameStarted => {
                if self.status == SessionStatus::Start {
                    let mut fresh = Self::new(self.id, self.scenario);
                    fresh.status = SessionStatus::Playing;
                    return fresh;
                }
            }
            SessionEvent::FragmentMoved { from, to } => {
                if self.is_playing() {
                    self.fragments.move_fragment(from, to);
                }
            }
            SessionEvent::MoveBegun { index } => {
                if self.is_playing() {
                    self.fragments.begin_move(index);
                }
            }
            SessionEvent::MoveProposed { target } => {
                if self.is_playing() {
                    self.fragments.propose_move(target);
                }
            }
            SessionEvent::MoveCommitted => {
                if self.is_playing() {
                    self.fragments.commit_move();
                }
            }
            SessionEvent::OrderReset => {
                if self.is_playing() {
                    self.fragments.reset_to_round_start();
                }
            }
            SessionEvent::TurnSubmitted { correlation_id } => {
                if self.is_playing() {
                    self.fragments.commit_move();
                    self.pending = Some(PendingTurn {
                        correlation_id,
                        submitted_sequence: self.fragments.texts(),
                    });
                    self.status = SessionStatus::Loading;
                    self.notice = None;
                }
            }
            SessionEvent::TurnResolved {
                correlation_id,
                resolution,
            } => {
                if self.is_pending(correlation_id) {
                    self.commit_turn(*resolution);
                }
            }
            SessionEvent::TurnFailed { correlation_id, .. } => {
                if self.is_pending(correlation_id) {
                    self.pending = None;
                    self.status = SessionStatus::Playing;
                    self.notice = Some(self.scenario.failure_notice.clone());
                }
            }
            SessionEvent::SessionReset => return Self::new(self.id, self.scenario),
        }
        self
    }

    fn commit_turn(&mut self, resolution: ResolvedTurn) {
        let ResolvedTurn {
            turn,
            vitals,
            next_fragments,
            ending,
            ending_text,
        } = resolution;

        self.last_interpretation = Some(turn.interpretation.clone());
        self.tone.clone_from(&turn.tone);
        self.history.append(turn);
        self.vitals = vitals;
        self.fragments = FragmentStore::new(next_fragments);
        self.pending = None;
        self.notice = None;

        match ending {
            Some(ending) => {
                let text = ending_text
                    .unwrap_or_else(|| self.scenario.endings.fallback(&ending).to_owned());
                self.ending_text = Some(text);
                self.status = SessionStatus::from(&ending);
            }
            None => self.status = SessionStatus::Playing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fragments::Fragment;
    use crate::domain::scenario::EndingConfig;
    use crate::domain::vitals::{TerminalPolicy, TrackSpec, VitalsConfig};
    use fragments_core::oracle::{ProposedFragment, VitalsMap};
    use fragments_test_support::fixed_now;

    fn scenario(lower: i32, upper: i32, initial: i32) -> Arc<Scenario> {
        Arc::new(Scenario {
            title: "Test".to_owned(),
            turn_context: Some("context".to_owned()),
            initial_fragments: vec![
                Fragment::free("a"),
                Fragment::anchored("B"),
                Fragment::free("c"),
                Fragment::anchored("D"),
                Fragment::free("e"),
            ],
            vitals: VitalsConfig {
                tracks: vec![TrackSpec {
                    name: "happiness".to_owned(),
                    lower,
                    upper,
                    initial,
                }],
                terminal: TerminalPolicy::LocalThresholds {
                    track: "happiness".to_owned(),
                    victory_at: 100,
                    failure_at: 0,
                },
            },
            endings: EndingConfig {
                victory_fallback: "together".to_owned(),
                failure_fallback: "silence".to_owned(),
                victory_directions: Some("be warm".to_owned()),
                failure_directions: None,
            },
            failure_notice: "try again".to_owned(),
        })
    }

    fn playing(scenario: Arc<Scenario>) -> Session {
        Session::new(Uuid::new_v4(), scenario).apply(SessionEvent::GameStarted)
    }

    fn response(change: i32) -> TurnResponse {
        TurnResponse {
            vitals_delta: VitalsMap::from([("happiness".to_owned(), change)]),
            interpretation: "She steadies herself.".to_owned(),
            next_fragments: vec![
                ProposedFragment::new("x", true),
                ProposedFragment::new("y", false),
            ],
            tone: Some("hopeful".to_owned()),
            ..TurnResponse::default()
        }
    }

    fn submit(session: Session) -> (Session, Uuid) {
        let correlation_id = Uuid::new_v4();
        (
            session.apply(SessionEvent::TurnSubmitted { correlation_id }),
            correlation_id,
        )
    }

    fn resolve(session: Session, correlation_id: Uuid, response: TurnResponse) -> Session {
        let resolution = session
            .plan_turn(correlation_id, response, fixed_now())
            .unwrap();
        session.apply(SessionEvent::TurnResolved {
            correlation_id,
            resolution: Box::new(resolution),
        })
    }

    #[test]
    fn test_new_session_starts_with_initial_configuration() {
        let session = Session::new(Uuid::new_v4(), scenario(-10, 110, 50));

        assert_eq!(session.status(), &SessionStatus::Start);
        assert_eq!(session.vitals().get("happiness"), Some(50));
        assert_eq!(session.fragments().fragments().len(), 5);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_start_game_enters_playing() {
        let session = playing(scenario(-10, 110, 50));

        assert_eq!(session.status(), &SessionStatus::Playing);
    }

    #[test]
    fn test_moves_are_ignored_outside_playing() {
        // Arrange
        let session = Session::new(Uuid::new_v4(), scenario(-10, 110, 50));
        let before = session.clone();

        // Act
        let session = session.apply(SessionEvent::FragmentMoved { from: 0, to: 2 });

        // Assert
        assert_eq!(session, before);
    }

    #[test]
    fn test_anchored_drag_is_rejected() {
        let session = playing(scenario(-10, 110, 50));
        let before = session.fragments().clone();

        let session = session.apply(SessionEvent::FragmentMoved { from: 1, to: 4 });

        assert_eq!(session.fragments(), &before);
    }

    #[test]
    fn test_submit_captures_sequence_and_enters_loading() {
        // Arrange
        let session = playing(scenario(-10, 110, 50))
            .apply(SessionEvent::FragmentMoved { from: 4, to: 4 })
            .apply(SessionEvent::MoveBegun { index: 2 })
            .apply(SessionEvent::MoveCommitted);

        // Act
        let (session, correlation_id) = submit(session);

        // Assert
        assert_eq!(session.status(), &SessionStatus::Loading);
        let pending = session.pending().unwrap();
        assert_eq!(pending.correlation_id, correlation_id);
        assert_eq!(pending.submitted_sequence, vec!["a", "B", "c", "D", "e"]);
        let request = session.turn_request().unwrap();
        assert_eq!(request.current_vitals.get("happiness"), Some(&50));
        assert_eq!(request.turn_context.as_deref(), Some("context"));
    }

    #[test]
    fn test_second_submit_while_loading_is_ignored() {
        let (session, first) = submit(playing(scenario(-10, 110, 50)));

        let (session, second) = submit(session);

        assert!(session.is_pending(first));
        assert!(!session.is_pending(second));
    }

    #[test]
    fn test_successful_turn_appends_history_and_replaces_fragments() {
        // Arrange
        let (session, correlation_id) = submit(playing(scenario(-10, 110, 50)));

        // Act
        let session = resolve(session, correlation_id, response(20));

        // Assert
        assert_eq!(session.status(), &SessionStatus::Playing);
        assert_eq!(session.vitals().get("happiness"), Some(70));
        assert_eq!(session.history().len(), 1);
        let turn = session.history().latest().unwrap();
        assert_eq!(turn.turn_id, 1);
        assert_eq!(turn.submitted_sequence, vec!["a", "B", "c", "D", "e"]);
        assert_eq!(turn.resulting_vitals.get("happiness"), Some(70));
        assert_eq!(session.fragments().fragments()[0], Fragment::anchored("x"));
        assert!(!session.fragments().is_order_changed());
        assert_eq!(session.last_interpretation(), Some("She steadies herself."));
        assert_eq!(session.tone(), Some("hopeful"));
        assert!(session.pending().is_none());
    }

    #[test]
    fn test_clamped_turn_reaching_threshold_is_victory() {
        // Arrange
        let (session, correlation_id) = submit(playing(scenario(0, 100, 95)));

        // Act
        let session = resolve(session, correlation_id, response(12));

        // Assert
        assert_eq!(session.vitals().get("happiness"), Some(100));
        assert_eq!(session.status(), &SessionStatus::Victory);
        assert_eq!(session.ending_text(), Some("together"));
    }

    #[test]
    fn test_failure_without_ending_text_uses_fallback() {
        let (session, correlation_id) = submit(playing(scenario(-10, 110, 50)));

        let session = resolve(session, correlation_id, response(-60));

        assert_eq!(session.vitals().get("happiness"), Some(-10));
        assert_eq!(session.status(), &SessionStatus::Failure);
        assert_eq!(session.ending_text(), Some("silence"));
    }

    #[test]
    fn test_embedded_ending_text_is_kept() {
        let (session, correlation_id) = submit(playing(scenario(-10, 110, 50)));
        let mut answer = response(-60);
        answer.ending_text = Some("She lets the phone ring out.".to_owned());

        let session = resolve(session, correlation_id, answer);

        assert_eq!(session.ending_text(), Some("She lets the phone ring out."));
    }

    #[test]
    fn test_failed_turn_rolls_back_completely() {
        // Arrange
        let scenario = Arc::new(Scenario::default());
        let session = playing(scenario.clone())
            .apply(SessionEvent::FragmentMoved { from: 3, to: 2 })
            .apply(SessionEvent::MoveBegun { index: 0 });
        let order_before = session.fragments().fragments().to_vec();
        let round_start_before = session.fragments().round_start().to_vec();
        let vitals_before = session.vitals().clone();
        let history_before = session.history().clone();
        let (loading, correlation_id) = submit(session);

        // Act
        let session = loading.apply(SessionEvent::TurnFailed {
            correlation_id,
            reason: "connection refused".to_owned(),
        });

        // Assert
        assert_ne!(order_before, round_start_before);
        assert_eq!(session.status(), &SessionStatus::Playing);
        assert_eq!(session.fragments().fragments(), order_before.as_slice());
        assert_eq!(session.fragments().round_start(), round_start_before.as_slice());
        assert_eq!(session.fragments().dragging(), None);
        assert_eq!(session.vitals(), &vitals_before);
        assert_eq!(session.history(), &history_before);
        assert_eq!(session.notice(), Some(scenario.failure_notice.as_str()));
        assert!(session.pending().is_none());
    }

    #[test]
    fn test_stale_resolution_is_ignored_after_reset() {
        // Arrange
        let (loading, correlation_id) = submit(playing(scenario(-10, 110, 50)));
        let resolution = loading
            .plan_turn(correlation_id, response(10), fixed_now())
            .unwrap();

        // Act
        let session = loading
            .apply(SessionEvent::SessionReset)
            .apply(SessionEvent::TurnResolved {
                correlation_id,
                resolution: Box::new(resolution),
            });

        // Assert
        assert_eq!(session.status(), &SessionStatus::Start);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_reset_reinitializes_from_any_status() {
        let (session, correlation_id) = submit(playing(scenario(-10, 110, 50)));
        let ended = resolve(session, correlation_id, response(-60));
        let id = ended.id;

        let reset = ended.apply(SessionEvent::SessionReset);

        assert_eq!(reset, Session::new(id, scenario(-10, 110, 50)));
    }

    #[test]
    fn test_history_grows_by_one_per_resolved_turn() {
        let mut session = playing(scenario(-10, 110, 50));

        for expected in 1..=3 {
            let (loading, correlation_id) = submit(session);
            session = resolve(loading, correlation_id, response(5));
            assert_eq!(session.history().len(), expected);
        }
        assert_eq!(session.vitals().get("happiness"), Some(65));
    }

    #[test]
    fn test_plan_turn_rejects_contract_violations() {
        let (session, correlation_id) = submit(playing(scenario(-10, 110, 50)));

        let mut blank = response(5);
        blank.interpretation = "   ".to_owned();
        let mut unknown = response(5);
        unknown.vitals_delta.insert("despair".to_owned(), 3);
        let mut empty = response(5);
        empty.next_fragments.clear();

        for bad in [blank, unknown, empty] {
            let result = session.plan_turn(correlation_id, bad, fixed_now());
            assert!(matches!(result, Err(DomainError::OracleContract(_))));
        }
    }

    #[test]
    fn test_terminal_turn_may_omit_next_fragments() {
        let (session, correlation_id) = submit(playing(scenario(-10, 110, 50)));
        let mut answer = response(-60);
        answer.next_fragments.clear();

        let resolution = session.plan_turn(correlation_id, answer, fixed_now()).unwrap();

        assert_eq!(resolution.ending, Some(Ending::Failure));
        assert!(resolution.next_fragments.is_empty());
    }

    #[test]
    fn test_plan_turn_requires_matching_submission() {
        let (session, _) = submit(playing(scenario(-10, 110, 50)));

        let result = session.plan_turn(Uuid::new_v4(), response(1), fixed_now());

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_ending_request_carries_recent_turns_and_directions() {
        // Arrange
        let mut session = playing(scenario(-10, 110, 50));
        for _ in 0..3 {
            let (loading, correlation_id) = submit(session);
            session = resolve(loading, correlation_id, response(10));
        }
        let (loading, correlation_id) = submit(session);
        let resolution = loading
            .plan_turn(correlation_id, response(30), fixed_now())
            .unwrap();

        // Act
        let request = loading.ending_request(&resolution).unwrap();

        // Assert
        assert!(request.is_victory);
        assert_eq!(request.ending_kind, "victory");
        let ids: Vec<u32> = request.recent_history.iter().map(|t| t.turn_id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(request.directions.as_deref(), Some("be warm"));
    }
}
