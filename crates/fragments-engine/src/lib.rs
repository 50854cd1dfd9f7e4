//! Fragments — turn-resolution engine.
//!
//! Responsible for fragment mutability and reordering, bounded vitals,
//! the append-only turn history, and the session state machine that drives
//! each submission through the narrative oracle.

pub mod application;
pub mod domain;
