//! Port interface for the time-adjustment ledger

use async_trait::async_trait;
use tempo_domain::{Activity, Result, TimeAdjustment};
use uuid::Uuid;

/// Append-only store for manual time corrections.
#[async_trait]
pub trait AdjustmentStore: Send + Sync {
    /// Append the audit record and set the activity total to
    /// `adjustment.new_seconds` in one atomic unit: no observer may see the
    /// updated total without the matching ledger entry, or vice versa.
    ///
    /// The store must verify the stored total still equals
    /// `adjustment.previous_seconds` inside that unit and fail `Internal`
    /// otherwise (concurrent mutation slipped between read and write).
    /// Returns the updated activity.
    async fn record(&self, adjustment: TimeAdjustment) -> Result<Activity>;

    /// Ledger entries for an activity, oldest first.
    async fn entries_for(&self, activity_id: Uuid) -> Result<Vec<TimeAdjustment>>;
}
