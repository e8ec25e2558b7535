//! Audit ledger records
//!
//! Both record types are append-only: never mutated or deleted once written.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::TempoError;

/// Direction of a manual time correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentDirection {
    Add,
    Subtract,
}

/// Immutable audit record of a manual correction to accumulated time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeAdjustment {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub acting_user_id: Uuid,
    pub previous_seconds: i64,
    pub new_seconds: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle action recorded in the activity timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    Started,
    Paused,
    Completed,
    Cancelled,
}

impl ActivityAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityAction {
    type Err = TempoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "created" => Ok(Self::Created),
            "started" => Ok(Self::Started),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(TempoError::InvalidInput(format!("unknown activity action '{other}'"))),
        }
    }
}

/// Immutable timeline record of a lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub acting_user_id: Uuid,
    pub action: ActivityAction,
    /// Title at the moment the event fired; the activity may be renamed
    /// later without rewriting history.
    pub title_snapshot: String,
    pub time_spent_seconds: Option<i64>,
    pub created_at: DateTime<Utc>,
}
