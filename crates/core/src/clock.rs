//! Wall-clock time source
//!
//! Services never call `Utc::now()` directly; the clock is injected so tests
//! can drive session boundaries deterministically.

use chrono::{DateTime, Utc};

/// Time source used to stamp session boundaries and compute durations.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
