//! Prompt text and response schema.

use std::fmt::Write as _;

use fragments_core::error::DomainError;
use fragments_core::oracle::{EndingRequest, TurnRequest};
use serde_json::{Value, json};

pub(crate) fn turn_prompt(request: &TurnRequest) -> String {
    let mut prompt = format!(
        "Ordered Sequence: {}\n",
        request.ordered_fragments.join(" -> ")
    );
    for (track, value) in &request.current_vitals {
        let _ = writeln!(prompt, "Current {track}: {value}");
    }
    if let Some(context) = &request.turn_context {
        let _ = writeln!(prompt, "Context: {context}");
    }
    prompt.push_str(
        "\nInterpret this sequence and provide the vitals delta, summary, and next \
         fragments (designate 1-2 as fixed).",
    );
    prompt
}

/// Response schema for a turn, with one integer property per vital track.
pub(crate) fn turn_schema<'a>(tracks: impl IntoIterator<Item = &'a str>) -> Value {
    let tracks: Vec<&str> = tracks.into_iter().collect();
    let delta_properties: serde_json::Map<String, Value> = tracks
        .iter()
        .map(|track| ((*track).to_owned(), json!({ "type": "INTEGER" })))
        .collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "vitals_delta": {
                "type": "OBJECT",
                "properties": delta_properties,
                "required": tracks,
            },
            "interpretation_summary": { "type": "STRING" },
            "next_fragments": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "text": { "type": "STRING" },
                        "is_fixed": { "type": "BOOLEAN" }
                    },
                    "required": ["text", "is_fixed"]
                }
            },
            "tone": { "type": "STRING" },
            "is_game_over": { "type": "BOOLEAN" },
            "ending_kind": { "type": "STRING" },
            "ending_text": { "type": "STRING" }
        },
        "required": ["vitals_delta", "interpretation_summary", "next_fragments", "tone"]
    })
}

pub(crate) fn ending_prompt(request: &EndingRequest) -> Result<String, DomainError> {
    let outcome = match request.ending_kind.as_str() {
        "victory" => "Victory",
        "failure" => "Failure",
        other => other,
    };
    let summary = serde_json::to_string(&request.recent_history)
        .map_err(|e| DomainError::Infrastructure(format!("cannot encode history: {e}")))?;

    let mut prompt = format!(
        "The game has ended in {outcome}.\nSummary: {summary}\n\
         Write a concluding narrative paragraph (approx 100 words).\n"
    );
    if let Some(directions) = &request.directions {
        prompt.push_str(directions);
    }
    Ok(prompt)
}
