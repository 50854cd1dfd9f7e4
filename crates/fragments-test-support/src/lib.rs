//! Shared test mocks and utilities for the Fragments narrative engine.

mod clock;
mod oracle;

pub use clock::{FixedClock, fixed_now};
pub use oracle::{FailingOracle, ScriptedOracle};
