//! Vitals tracker: bounded numeric tracks and terminal-condition evaluation.

use std::collections::HashSet;

use fragments_core::error::DomainError;
use fragments_core::oracle::VitalsMap;
use serde::{Deserialize, Serialize};

/// Declaration of one vitals track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackSpec {
    /// Track name, e.g. `happiness` or `trust`.
    pub name: String,
    /// Inclusive lower bound.
    pub lower: i32,
    /// Inclusive upper bound.
    pub upper: i32,
    /// Value at session start.
    pub initial: i32,
}

impl TrackSpec {
    /// Clamps `value` into this track's bounds.
    #[must_use]
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.lower, self.upper)
    }
}

/// How the end of a session is detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum TerminalPolicy {
    /// Compare a primary track against fixed thresholds after every turn.
    LocalThresholds {
        /// The track that decides the outcome.
        track: String,
        /// Victory once the track reaches this value or more.
        victory_at: i32,
        /// Failure once the track falls to this value or less.
        failure_at: i32,
    },
    /// The session ends only when the oracle flags `is_game_over`.
    ExternalFlag,
}

/// The tracks of a scenario and its terminal policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VitalsConfig {
    /// Track declarations, in display order.
    pub tracks: Vec<TrackSpec>,
    /// Terminal-condition policy.
    pub terminal: TerminalPolicy,
}

impl VitalsConfig {
    /// Checks that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if there are no tracks, a name
    /// repeats, bounds are inverted, an initial value is out of bounds, or the
    /// threshold policy names an unknown track or inverted thresholds.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.tracks.is_empty() {
            return Err(DomainError::Validation(
                "at least one vitals track is required".to_owned(),
            ));
        }
        let mut seen = HashSet::new();
        for track in &self.tracks {
            if !seen.insert(track.name.as_str()) {
                return Err(DomainError::Validation(format!(
                    "duplicate vitals track: {}",
                    track.name
                )));
            }
            if track.lower > track.upper {
                return Err(DomainError::Validation(format!(
                    "track {} has lower bound {} above upper bound {}",
                    track.name, track.lower, track.upper
                )));
            }
            if track.initial < track.lower || track.initial > track.upper {
                return Err(DomainError::Validation(format!(
                    "track {} starts at {} outside [{}, {}]",
                    track.name, track.initial, track.lower, track.upper
                )));
            }
        }
        if let TerminalPolicy::LocalThresholds {
            track,
            victory_at,
            failure_at,
        } = &self.terminal
        {
            if self.track(track).is_none() {
                return Err(DomainError::Validation(format!(
                    "terminal policy references unknown track: {track}"
                )));
            }
            if failure_at >= victory_at {
                return Err(DomainError::Validation(format!(
                    "failure threshold {failure_at} must be below victory threshold {victory_at}"
                )));
            }
        }
        Ok(())
    }

    /// Looks up a track declaration by name.
    #[must_use]
    pub fn track(&self, name: &str) -> Option<&TrackSpec> {
        self.tracks.iter().find(|t| t.name == name)
    }

    /// Vitals at session start.
    #[must_use]
    pub fn initial_vitals(&self) -> Vitals {
        Vitals {
            values: self
                .tracks
                .iter()
                .map(|t| (t.name.clone(), t.initial))
                .collect(),
        }
    }

    /// Track names, in declaration order.
    #[must_use]
    pub fn track_names(&self) -> Vec<&str> {
        self.tracks.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Current value of every track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Vitals {
    values: VitalsMap,
}

impl Vitals {
    /// Value of a track.
    #[must_use]
    pub fn get(&self, track: &str) -> Option<i32> {
        self.values.get(track).copied()
    }

    /// All values, keyed by track name.
    #[must_use]
    pub fn as_map(&self) -> &VitalsMap {
        &self.values
    }
}

/// Checks that a delta only touches declared tracks.
///
/// # Errors
///
/// Returns `DomainError::OracleContract` naming the first unknown track.
pub fn validate_delta(delta: &VitalsMap, config: &VitalsConfig) -> Result<(), DomainError> {
    match delta.keys().find(|name| config.track(name).is_none()) {
        Some(unknown) => Err(DomainError::OracleContract(format!(
            "vitals delta names unknown track: {unknown}"
        ))),
        None => Ok(()),
    }
}

/// Applies `delta` to `current`, clamping every touched track into its
/// bounds. Tracks absent from `delta`, and names without a declaration, are
/// left as they are.
#[must_use]
pub fn apply_delta(current: &Vitals, delta: &VitalsMap, config: &VitalsConfig) -> Vitals {
    let mut values = current.values.clone();
    for (name, change) in delta {
        let Some(spec) = config.track(name) else {
            continue;
        };
        let base = values.get(name).copied().unwrap_or(spec.initial);
        values.insert(name.clone(), spec.clamp(base.saturating_add(*change)));
    }
    Vitals { values }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ending {
    /// The primary track reached the victory threshold, or the oracle said so.
    Victory,
    /// The primary track fell to the failure threshold, or the oracle said so.
    Failure,
    /// A scripted ending named by the oracle.
    Scripted(String),
}

/// Ending tag used when the oracle flags game-over without naming a kind.
pub const DEFAULT_ENDING_KIND: &str = "game_over";

impl Ending {
    /// Maps an oracle ending tag onto an ending.
    #[must_use]
    pub fn from_kind(kind: Option<&str>) -> Self {
        match kind.map(str::trim) {
            Some("victory") => Self::Victory,
            Some("failure") => Self::Failure,
            Some(other) if !other.is_empty() => Self::Scripted(other.to_owned()),
            _ => Self::Scripted(DEFAULT_ENDING_KIND.to_owned()),
        }
    }

    /// The ending's tag.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Victory => "victory",
            Self::Failure => "failure",
            Self::Scripted(kind) => kind,
        }
    }

    /// Returns `true` only for [`Ending::Victory`].
    #[must_use]
    pub fn is_victory(&self) -> bool {
        matches!(self, Self::Victory)
    }
}

/// Decides whether the session has ended.
///
/// Under [`TerminalPolicy::LocalThresholds`] only the primary track matters
/// and oracle flags are ignored; under [`TerminalPolicy::ExternalFlag`] only
/// the oracle's `is_game_over` flag does.
#[must_use]
pub fn evaluate_terminal(
    vitals: &Vitals,
    policy: &TerminalPolicy,
    is_game_over: Option<bool>,
    ending_kind: Option<&str>,
) -> Option<Ending> {
    match policy {
        TerminalPolicy::LocalThresholds {
            track,
            victory_at,
            failure_at,
        } => {
            let value = vitals.get(track)?;
            if value >= *victory_at {
                Some(Ending::Victory)
            } else if value <= *failure_at {
                Some(Ending::Failure)
            } else {
                None
            }
        }
        TerminalPolicy::ExternalFlag => {
            if is_game_over == Some(true) {
                Some(Ending::from_kind(ending_kind))
            } else {
                None
            }
        }
    }
}
