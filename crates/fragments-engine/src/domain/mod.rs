//! Domain model: plain values and pure transitions.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod fragments;
pub mod history;
pub mod scenario;
pub mod vitals;
