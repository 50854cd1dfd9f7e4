//! Wire types for the `generateContent` endpoint.

use fragments_core::oracle::{ProposedFragment, TurnResponse, VitalsMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub system_instruction: Content,
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    pub fn new(system_instruction: &str, prompt: String) -> Self {
        Self {
            system_instruction: Content::text(system_instruction.to_owned()),
            contents: vec![Content::user(prompt)],
            generation_config: None,
        }
    }

    pub fn with_json_schema(mut self, schema: Value) -> Self {
        self.generation_config = Some(GenerationConfig {
            response_mime_type: "application/json".to_owned(),
            response_schema: schema,
        });
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn text(text: String) -> Self {
        Self {
            role: None,
            parts: vec![Part { text: Some(text) }],
        }
    }

    fn user(text: String) -> Self {
        Self {
            role: Some("user".to_owned()),
            ..Self::text(text)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it has any non-blank
    /// text.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// The JSON document the model is asked to produce for a turn.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TurnPayload {
    #[serde(default)]
    pub vitals_delta: VitalsMap,
    pub interpretation_summary: String,
    #[serde(default)]
    pub next_fragments: Vec<FragmentPayload>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub is_game_over: Option<bool>,
    #[serde(default)]
    pub ending_kind: Option<String>,
    #[serde(default)]
    pub ending_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FragmentPayload {
    pub text: String,
    #[serde(default)]
    pub is_fixed: Option<bool>,
}

impl From<TurnPayload> for TurnResponse {
    fn from(payload: TurnPayload) -> Self {
        Self {
            vitals_delta: payload.vitals_delta,
            interpretation: payload.interpretation_summary,
            next_fragments: payload
                .next_fragments
                .into_iter()
                .map(|f| ProposedFragment {
                    text: f.text,
                    anchored: f.is_fixed,
                })
                .collect(),
            is_game_over: payload.is_game_over,
            ending_kind: payload.ending_kind.filter(|k| !k.trim().is_empty()),
            ending_text: payload.ending_text.filter(|t| !t.trim().is_empty()),
            tone: payload.tone,
        }
    }
}
