//! Scenario: the fixed configuration a session starts from and resets to.

use fragments_core::error::DomainError;
use serde::{Deserialize, Serialize};

use super::fragments::Fragment;
use super::vitals::{Ending, TerminalPolicy, TrackSpec, VitalsConfig};

fn default_failure_notice() -> String {
    "The oracle could not interpret this order. Please try again.".to_owned()
}

/// Closing texts and directions for each way a session can end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndingConfig {
    /// Shown after a victory when the oracle cannot write an ending.
    pub victory_fallback: String,
    /// Shown after any other ending when the oracle cannot write one.
    pub failure_fallback: String,
    /// What a victorious ending should describe.
    #[serde(default)]
    pub victory_directions: Option<String>,
    /// What any other ending should describe.
    #[serde(default)]
    pub failure_directions: Option<String>,
}

impl EndingConfig {
    /// Fallback text for `ending`.
    #[must_use]
    pub fn fallback(&self, ending: &Ending) -> &str {
        if ending.is_victory() {
            &self.victory_fallback
        } else {
            &self.failure_fallback
        }
    }

    /// Oracle directions for `ending`.
    #[must_use]
    pub fn directions(&self, ending: &Ending) -> Option<&str> {
        if ending.is_victory() {
            self.victory_directions.as_deref()
        } else {
            self.failure_directions.as_deref()
        }
    }
}

/// A complete game definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Display title.
    pub title: String,
    /// Premise handed to the oracle with every turn.
    #[serde(default)]
    pub turn_context: Option<String>,
    /// Fragments of the first turn.
    pub initial_fragments: Vec<Fragment>,
    /// Tracks and terminal policy.
    pub vitals: VitalsConfig,
    /// Ending texts.
    pub endings: EndingConfig,
    /// Notice shown when a submission has to be rolled back.
    #[serde(default = "default_failure_notice")]
    pub failure_notice: String,
}

impl Scenario {
    /// Parses and validates a scenario from YAML.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the YAML is malformed or the
    /// scenario fails [`Scenario::validate`].
    pub fn from_yaml(source: &str) -> Result<Self, DomainError> {
        let scenario: Self = serde_yaml::from_str(source)
            .map_err(|e| DomainError::Validation(format!("invalid scenario: {e}")))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Checks the scenario is playable.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if there are no initial fragments, a
    /// fragment is blank, or the vitals configuration is inconsistent.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.initial_fragments.is_empty() {
            return Err(DomainError::Validation(
                "scenario needs at least one initial fragment".to_owned(),
            ));
        }
        if self.initial_fragments.iter().any(|f| f.text.trim().is_empty()) {
            return Err(DomainError::Validation(
                "initial fragments must not be blank".to_owned(),
            ));
        }
        self.vitals.validate()
    }

    /// The built-in scenario: a single happiness track steered by the
    /// protagonist's fragmented thoughts.
    #[must_use]
    pub fn fragments_of_her_heart() -> Self {
        Self {
            title: "Fragments of Her Heart".to_owned(),
            turn_context: Some(
                "The player influences a love-stricken protagonist's fate by reordering her \
                 fragmented thoughts. Update happiness from the emotional trajectory of the \
                 sequence and designate 1 or 2 of the next 4-6 fragments as anchors."
                    .to_owned(),
            ),
            initial_fragments: vec![
                Fragment::free("He hasn't called."),
                Fragment::anchored(
                    "I know I should be stronger than this, yet I find myself checking my \
                     phone every time the wind rattles the windowpane.",
                ),
                Fragment::free("Strength is just a lie I tell my mirror before the sun goes down."),
                Fragment::free("Maybe he's just busy."),
                Fragment::anchored(
                    "I wonder if the cold coffee on my desk tastes like the regret I'm trying \
                     so hard not to swallow.",
                ),
            ],
            vitals: VitalsConfig {
                tracks: vec![TrackSpec {
                    name: "happiness".to_owned(),
                    lower: -10,
                    upper: 110,
                    initial: 50,
                }],
                terminal: TerminalPolicy::LocalThresholds {
                    track: "happiness".to_owned(),
                    victory_at: 100,
                    failure_at: 0,
                },
            },
            endings: EndingConfig {
                victory_fallback: "They finally stood together, their hearts whole once more."
                    .to_owned(),
                failure_fallback: "The story concludes in silence...".to_owned(),
                victory_directions: Some(
                    "She has reconciled with the man she loves and they have decided to live \
                     together. Describe their warm, shared future."
                        .to_owned(),
                ),
                failure_directions: Some(
                    "Describe her emotional collapse or the destructive choice that loses him \
                     forever."
                        .to_owned(),
                ),
            },
            failure_notice: "Something went wrong with her thoughts. Please try again."
                .to_owned(),
        }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::fragments_of_her_heart()
    }
}
