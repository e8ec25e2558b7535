//! Time adjustment service

use std::sync::Arc;

use tempo_domain::{
    Activity, ActivityEvent, ActivityEventKind, ActivityStatus, AdjustmentDirection, Result,
    TempoError, TimeAdjustment,
};
use tracing::warn;
use uuid::Uuid;

use super::ports::AdjustmentStore;
use crate::clock::Clock;
use crate::events::ports::EventPublisher;
use crate::lifecycle::ports::{ActivityStore, CollaboratorStore};

/// Applies manual corrections to accumulated time, writing the audit ledger
/// and the new total atomically.
pub struct TimeAdjustmentService {
    activities: Arc<dyn ActivityStore>,
    adjustments: Arc<dyn AdjustmentStore>,
    collaborators: Arc<dyn CollaboratorStore>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl TimeAdjustmentService {
    pub fn new(
        activities: Arc<dyn ActivityStore>,
        adjustments: Arc<dyn AdjustmentStore>,
        collaborators: Arc<dyn CollaboratorStore>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { activities, adjustments, collaborators, publisher, clock }
    }

    /// Apply a manual correction of `seconds` in `direction`.
    ///
    /// Permitted only while the activity is `paused` or `completed`.
    /// Subtracting past zero fails `InsufficientTime` without mutating
    /// anything; there is no clamping path.
    pub async fn adjust_time(
        &self,
        activity_id: Uuid,
        acting_user: Uuid,
        seconds: i64,
        direction: AdjustmentDirection,
        reason: &str,
    ) -> Result<Activity> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(TempoError::InvalidInput("adjustment reason is required".into()));
        }
        if seconds <= 0 {
            return Err(TempoError::InvalidInput(
                "adjustment amount must be a positive number of seconds".into(),
            ));
        }

        let activity = self.activities.fetch(activity_id).await?;
        if !matches!(activity.status, ActivityStatus::Paused | ActivityStatus::Completed) {
            return Err(TempoError::InvalidInput(format!(
                "time can only be adjusted while paused or completed (status is '{}')",
                activity.status
            )));
        }

        let new_seconds = match direction {
            AdjustmentDirection::Add => activity.total_seconds + seconds,
            AdjustmentDirection::Subtract => {
                if seconds > activity.total_seconds {
                    return Err(TempoError::InsufficientTime {
                        requested_seconds: seconds,
                        available_seconds: activity.total_seconds,
                    });
                }
                activity.total_seconds - seconds
            }
        };

        let now = self.clock.now();
        let adjustment = TimeAdjustment {
            id: Uuid::new_v4(),
            activity_id,
            acting_user_id: acting_user,
            previous_seconds: activity.total_seconds,
            new_seconds,
            reason: reason.to_string(),
            created_at: now,
        };

        let updated = self.adjustments.record(adjustment).await?;

        match self.collaborators.fetch(updated.owner_id).await {
            Ok(owner) => self.publisher.publish(ActivityEvent {
                kind: ActivityEventKind::TimeAdjusted,
                activity: updated.clone(),
                sector_id: owner.sector_id,
                occurred_at: now,
            }),
            Err(err) => {
                warn!(error = %err, activity_id = %updated.id, "owner lookup failed, event dropped");
            }
        }

        Ok(updated)
    }

    /// Audit ledger for an activity, oldest first.
    pub async fn ledger(&self, activity_id: Uuid) -> Result<Vec<TimeAdjustment>> {
        self.adjustments.entries_for(activity_id).await
    }
}
