//! Session types
//!
//! A session is one contiguous timing interval for an activity. At most one
//! session per activity may be open at any time; the accumulated activity
//! total is the sum of closed-session durations plus manual adjustments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single contiguous timing interval for one activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// `None` while the session is open.
    pub ended_at: Option<DateTime<Utc>>,
    /// Computed as `ended_at - started_at` once closed; `None` while open.
    pub duration_seconds: Option<i64>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Seconds elapsed since the session opened, against the supplied `now`.
    ///
    /// Used by callers to compute a live-updating display without a server
    /// round-trip: `activity.total_seconds + session.elapsed_seconds(now)`.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_seconds().max(0)
    }
}
