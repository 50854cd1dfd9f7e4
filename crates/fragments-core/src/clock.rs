//! Clock abstraction used to timestamp resolved turns.

use chrono::{DateTime, Utc};

/// Source of wall-clock time. Injected so turn history stays reproducible
/// under test.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
