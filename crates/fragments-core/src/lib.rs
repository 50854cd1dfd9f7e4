//! Fragments Core — shared abstractions.
//!
//! This crate defines the error type, the clock and command traits, and the
//! narrative oracle contract that the engine, the oracle adapter, and the
//! test support crate all depend on. It contains no infrastructure code.

pub mod clock;
pub mod command;
pub mod error;
pub mod oracle;
