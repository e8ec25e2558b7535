//! Port interfaces for the activity lifecycle
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations. The store contracts carry the
//! atomicity requirements: transitions are compare-and-set operations, and
//! the single-active-per-collaborator guard is enforced inside the same
//! atomic unit as the write it protects.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempo_domain::{
    Activity, ActivityLogEntry, ActivityPatch, ActivityStatus, Collaborator, Result, Subtask,
};
use uuid::Uuid;

/// Field assignments applied together with a status change.
///
/// `None` leaves the corresponding column untouched, so a transition writes
/// exactly the fields its table row in the lifecycle rules names.
#[derive(Debug, Clone)]
pub struct TransitionChange {
    pub status: ActivityStatus,
    pub total_seconds: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub completion_notes: Option<String>,
    pub evidence_ref: Option<String>,
    /// When set, the store must reject the transition with `AlreadyActive`
    /// (carrying the conflicting id) if this owner already has a different
    /// activity in progress. Checked within the same atomic unit as the
    /// status write.
    pub exclusive_for_owner: Option<Uuid>,
}

impl TransitionChange {
    /// A change that writes nothing but the status itself.
    pub fn status_only(status: ActivityStatus) -> Self {
        Self {
            status,
            total_seconds: None,
            started_at: None,
            paused_at: None,
            completed_at: None,
            cancelled_at: None,
            cancel_reason: None,
            completion_notes: None,
            evidence_ref: None,
            exclusive_for_owner: None,
        }
    }

    /// Apply the change to an activity snapshot. Stores call this inside
    /// their atomic unit so every implementation writes the same fields.
    pub fn apply(&self, activity: &mut Activity) {
        activity.status = self.status;
        if let Some(total) = self.total_seconds {
            activity.total_seconds = total;
        }
        if let Some(at) = self.started_at {
            activity.started_at = Some(at);
        }
        if let Some(at) = self.paused_at {
            activity.paused_at = Some(at);
        }
        if let Some(at) = self.completed_at {
            activity.completed_at = Some(at);
        }
        if let Some(at) = self.cancelled_at {
            activity.cancelled_at = Some(at);
        }
        if let Some(reason) = &self.cancel_reason {
            activity.cancel_reason = Some(reason.clone());
        }
        if let Some(notes) = &self.completion_notes {
            activity.completion_notes = Some(notes.clone());
        }
        if let Some(evidence) = &self.evidence_ref {
            activity.evidence_ref = Some(evidence.clone());
        }
    }
}

/// Trait for persisting activities and their subtasks.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Insert a new activity with its subtasks.
    ///
    /// When the activity is created directly in `in_progress`, the store
    /// must enforce the single-active invariant for its owner atomically
    /// with the insert, failing `AlreadyActive` and writing nothing.
    async fn insert(&self, activity: Activity, subtasks: Vec<Subtask>) -> Result<()>;

    /// Fetch an activity by id, failing `NotFound` if absent.
    async fn fetch(&self, id: Uuid) -> Result<Activity>;

    /// Fetch the subtasks of an activity ordered by position.
    async fn fetch_subtasks(&self, activity_id: Uuid) -> Result<Vec<Subtask>>;

    /// Atomically compare the current status against `expected` and apply
    /// `change`.
    ///
    /// Fails `InvalidTransition { from: current, .. }` when the status
    /// changed concurrently, so of two racing identical transitions exactly
    /// one succeeds. Returns the updated activity.
    async fn apply_transition(
        &self,
        id: Uuid,
        expected: ActivityStatus,
        change: TransitionChange,
    ) -> Result<Activity>;

    /// Update the editable fields of a live activity.
    ///
    /// Fails `ActivityLocked` when the current status no longer permits
    /// edits, checked atomically with the write.
    async fn update_details(&self, id: Uuid, patch: ActivityPatch) -> Result<Activity>;

    /// Set a subtask's completed flag, failing `ActivityLocked` when the
    /// owning activity is terminal. Returns the updated subtask.
    async fn set_subtask(&self, subtask_id: Uuid, completed: bool) -> Result<Subtask>;

    /// List activities owned by a collaborator.
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Activity>>;

    /// List activities owned by collaborators of a sector.
    async fn list_by_sector(&self, sector_id: Uuid) -> Result<Vec<Activity>>;

    /// List every activity. Authorization is the caller's concern.
    async fn list_all(&self) -> Result<Vec<Activity>>;
}

/// Append-only store for the activity timeline.
#[async_trait]
pub trait ActivityLogStore: Send + Sync {
    async fn append(&self, entry: ActivityLogEntry) -> Result<()>;

    async fn entries_for(&self, activity_id: Uuid) -> Result<Vec<ActivityLogEntry>>;
}

/// Trait for reading collaborator profiles.
#[async_trait]
pub trait CollaboratorStore: Send + Sync {
    /// Fetch a collaborator by id, failing `NotFound` if absent.
    async fn fetch(&self, id: Uuid) -> Result<Collaborator>;

    /// Insert a collaborator profile (sync from the identity layer).
    async fn insert(&self, collaborator: Collaborator) -> Result<()>;

    async fn list_by_sector(&self, sector_id: Uuid) -> Result<Vec<Collaborator>>;
}
