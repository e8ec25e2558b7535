//! Manual clock for deterministic session math.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tempo_core::Clock;

/// Clock that only moves when a test advances it.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance_secs(&self, seconds: i64) {
        let mut now = self.now.lock().expect("clock lock");
        *now += Duration::seconds(seconds);
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().expect("clock lock") = at;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}
