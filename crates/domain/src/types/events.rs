//! Broadcast event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Activity;

/// What changed about the activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEventKind {
    Created,
    StatusChanged,
    SubtaskToggled,
    TimeAdjusted,
    DetailsUpdated,
}

/// Snapshot pushed to live subscribers after a successful mutation.
///
/// Not a source of truth: subscribers that miss an event reconcile by
/// re-fetching current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub kind: ActivityEventKind,
    pub activity: Activity,
    /// Sector of the owning collaborator, resolved at publish time.
    pub sector_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

/// Visibility scope of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum SubscriptionScope {
    /// Receives events for activities owned by collaborators of one sector.
    Sector { sector_id: Uuid },
    /// Receives every event regardless of sector.
    Admin,
}

impl SubscriptionScope {
    pub fn includes_sector(self, sector_id: Uuid) -> bool {
        match self {
            Self::Sector { sector_id: scoped } => scoped == sector_id,
            Self::Admin => true,
        }
    }
}
