//! Activity types
//!
//! The activity is the unit of trackable work. Its status only changes
//! through state-machine transitions in `tempo-core`; the fields here carry
//! no behaviour beyond small accessors.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::TempoError;

/// Lifecycle status of an activity.
///
/// A closed set: transition legality is checked exhaustively over these
/// variants, so an unknown status value cannot exist past deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Next,
    InProgress,
    Paused,
    Completed,
    Cancelled,
}

impl ActivityStatus {
    /// Stable textual form used for storage columns and log output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses reject every transition except the explicit
    /// `completed -> paused` revert.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Field edits (title, priority, subtask toggles) are only permitted
    /// while the activity is still live.
    pub fn allows_edits(self) -> bool {
        matches!(self, Self::Next | Self::InProgress | Self::Paused)
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityStatus {
    type Err = TempoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "next" => Ok(Self::Next),
            "in_progress" => Ok(Self::InProgress),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(TempoError::InvalidInput(format!("unknown activity status '{other}'"))),
        }
    }
}

/// Kind of activity: plain or gated by a checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Simple,
    Checklist,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Checklist => "checklist",
        }
    }
}

impl FromStr for ActivityKind {
    type Err = TempoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "simple" => Ok(Self::Simple),
            "checklist" => Ok(Self::Checklist),
            other => Err(TempoError::InvalidInput(format!("unknown activity kind '{other}'"))),
        }
    }
}

/// Priority assigned by the owning collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = TempoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(TempoError::InvalidInput(format!("unknown priority '{other}'"))),
        }
    }
}

/// The unit of trackable work, owned by exactly one collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub title: String,
    pub kind: ActivityKind,
    pub priority: Priority,
    pub status: ActivityStatus,
    /// Accumulated total across closed sessions and manual adjustments.
    /// Never negative.
    pub total_seconds: i64,
    pub owner_id: Uuid,
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Required iff status is `cancelled`.
    pub cancel_reason: Option<String>,
    /// Only meaningful iff status is `completed`.
    pub completion_notes: Option<String>,
    /// Only meaningful iff status is `completed`.
    pub evidence_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    pub fn is_checklist(&self) -> bool {
        self.kind == ActivityKind::Checklist
    }
}

/// Checklist item owned by exactly one activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub title: String,
    pub completed: bool,
    pub position: i32,
}

/// How a newly created activity enters the lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ActivityStart {
    /// Created in `next`, waiting to be started.
    Queued,
    /// Started immediately: passes the concurrency guard and opens a session.
    Immediate,
    /// Backfill: created already `completed` with explicit historical
    /// instants. No session is ever opened for this path.
    Retroactive { started_at: DateTime<Utc>, ended_at: DateTime<Utc> },
}

/// Creation spec for an activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewActivity {
    pub title: String,
    pub kind: ActivityKind,
    pub priority: Priority,
    pub owner_id: Uuid,
    /// Subtask titles, in display order. Ignored for `simple` activities.
    #[serde(default)]
    pub subtasks: Vec<String>,
    pub start: ActivityStart,
}

/// Extras carried by a transition call, as required by the target status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransitionDetails {
    pub completion_notes: Option<String>,
    pub evidence_ref: Option<String>,
    pub cancel_reason: Option<String>,
}

/// Partial update for the editable fields of a live activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityPatch {
    pub title: Option<String>,
    pub priority: Option<Priority>,
}

impl ActivityPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.priority.is_none()
    }
}
