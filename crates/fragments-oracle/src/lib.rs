//! Fragments — narrative oracle adapter.
//!
//! Implements [`fragments_core::oracle::NarrativeOracle`] on top of a
//! generative-language `generateContent` HTTP endpoint. Turn answers are
//! requested as JSON constrained by a response schema; endings are plain
//! text.

mod client;
mod config;
mod prompt;
mod wire;

pub use client::GenerativeOracle;
pub use config::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT, OracleConfig};
