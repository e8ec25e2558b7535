//! Activity lifecycle service - core business logic
//!
//! Orchestration order for every mutation: guards, then the atomic store
//! write, then session bookkeeping, then timeline + broadcast. Timeline and
//! broadcast failures never roll back the mutation; a failed mutation
//! prevents both.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempo_domain::{
    Activity, ActivityAction, ActivityEvent, ActivityEventKind, ActivityLogEntry, ActivityPatch,
    ActivityStart, ActivityStatus, NewActivity, Result, Session, Subtask, TempoError,
    TransitionDetails,
};
use tracing::warn;
use uuid::Uuid;

use super::ports::{ActivityLogStore, ActivityStore, CollaboratorStore, TransitionChange};
use super::transitions::check_transition;
use crate::clock::Clock;
use crate::events::ports::EventPublisher;
use crate::sessions::SessionLedger;

/// Activity lifecycle service
pub struct ActivityService {
    activities: Arc<dyn ActivityStore>,
    collaborators: Arc<dyn CollaboratorStore>,
    timeline: Arc<dyn ActivityLogStore>,
    sessions: Arc<SessionLedger>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl ActivityService {
    pub fn new(
        activities: Arc<dyn ActivityStore>,
        collaborators: Arc<dyn CollaboratorStore>,
        timeline: Arc<dyn ActivityLogStore>,
        sessions: Arc<SessionLedger>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { activities, collaborators, timeline, sessions, publisher, clock }
    }

    /// Create an activity.
    ///
    /// Three entry points into the lifecycle: queued (`next`), immediate
    /// (`in_progress`, passing the single-active guard and opening a
    /// session), and retroactive (`completed` with explicit historical
    /// instants, never opening a session).
    pub async fn create_activity(&self, spec: NewActivity) -> Result<Activity> {
        if spec.title.trim().is_empty() {
            return Err(TempoError::InvalidInput("activity title must not be empty".into()));
        }
        let owner = self.collaborators.fetch(spec.owner_id).await?;
        let now = self.clock.now();

        let mut activity = Activity {
            id: Uuid::new_v4(),
            title: spec.title.clone(),
            kind: spec.kind,
            priority: spec.priority,
            status: ActivityStatus::Next,
            total_seconds: 0,
            owner_id: spec.owner_id,
            started_at: None,
            paused_at: None,
            completed_at: None,
            cancelled_at: None,
            cancel_reason: None,
            completion_notes: None,
            evidence_ref: None,
            created_at: now,
        };

        let (action, time_spent) = match spec.start {
            ActivityStart::Queued => (ActivityAction::Created, None),
            ActivityStart::Immediate => {
                activity.status = ActivityStatus::InProgress;
                activity.started_at = Some(now);
                (ActivityAction::Started, None)
            }
            ActivityStart::Retroactive { started_at, ended_at } => {
                let total = validate_retroactive_range(started_at, ended_at, now)?;
                activity.status = ActivityStatus::Completed;
                activity.total_seconds = total;
                activity.started_at = Some(started_at);
                activity.completed_at = Some(ended_at);
                (ActivityAction::Completed, Some(total))
            }
        };

        let subtasks = build_subtasks(&activity, &spec.subtasks);
        self.activities.insert(activity.clone(), subtasks).await?;

        if activity.status == ActivityStatus::InProgress {
            self.sessions.open(activity.id, now).await?;
        }

        self.record_timeline(&activity, spec.owner_id, action, time_spent).await;
        self.publish(ActivityEventKind::Created, &activity, owner.sector_id, now);
        Ok(activity)
    }

    /// Apply a status transition.
    ///
    /// The store performs the status compare-and-set (and, for transitions
    /// into `in_progress`, the single-active guard) as one atomic unit, so
    /// two racing transitions against the same activity cannot both succeed.
    pub async fn transition(
        &self,
        activity_id: Uuid,
        acting_user: Uuid,
        target: ActivityStatus,
        details: TransitionDetails,
    ) -> Result<Activity> {
        let activity = self.activities.fetch(activity_id).await?;
        let from = activity.status;
        check_transition(from, target)?;
        let now = self.clock.now();

        let mut change = TransitionChange::status_only(target);
        let mut closes_session = false;
        let opens_session = target == ActivityStatus::InProgress;

        match target {
            ActivityStatus::InProgress => {
                change.exclusive_for_owner = Some(activity.owner_id);
                if from == ActivityStatus::Next {
                    change.started_at = Some(now);
                }
            }
            ActivityStatus::Paused => {
                if from == ActivityStatus::InProgress {
                    change.total_seconds =
                        Some(self.total_after_session_close(&activity, now).await?);
                    change.paused_at = Some(now);
                    closes_session = true;
                }
                // completed -> paused is the administrative revert: the
                // status flips back and nothing else is touched
            }
            ActivityStatus::Completed => {
                self.check_subtasks_complete(&activity).await?;
                if from == ActivityStatus::InProgress {
                    change.total_seconds =
                        Some(self.total_after_session_close(&activity, now).await?);
                    closes_session = true;
                }
                change.completed_at = Some(now);
                change.completion_notes = details.completion_notes.clone();
                change.evidence_ref = details.evidence_ref.clone();
            }
            ActivityStatus::Cancelled => {
                let reason = details
                    .cancel_reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|reason| !reason.is_empty())
                    .ok_or_else(|| {
                        TempoError::InvalidInput("cancellation reason is required".into())
                    })?;
                if from == ActivityStatus::InProgress {
                    change.total_seconds =
                        Some(self.total_after_session_close(&activity, now).await?);
                    closes_session = true;
                }
                change.cancelled_at = Some(now);
                change.cancel_reason = Some(reason.to_string());
            }
            ActivityStatus::Next => {
                return Err(TempoError::InvalidTransition { from, to: target });
            }
        }

        let updated = self.activities.apply_transition(activity_id, from, change).await?;

        // Session bookkeeping follows the committed status change. A failure
        // here is a consistency violation the guard should have prevented;
        // it aborts before timeline and broadcast.
        if closes_session {
            self.sessions.close(activity_id, now).await?;
        }
        if opens_session {
            self.sessions.open(activity_id, now).await?;
        }

        let (action, time_spent) = timeline_action(target, &updated);
        self.record_timeline(&updated, acting_user, action, time_spent).await;
        self.publish_for(ActivityEventKind::StatusChanged, &updated, now).await;
        Ok(updated)
    }

    /// Flip a subtask's completed flag.
    pub async fn toggle_subtask(&self, subtask_id: Uuid, completed: bool) -> Result<Subtask> {
        let subtask = self.activities.set_subtask(subtask_id, completed).await?;
        let activity = self.activities.fetch(subtask.activity_id).await?;
        self.publish_for(ActivityEventKind::SubtaskToggled, &activity, self.clock.now()).await;
        Ok(subtask)
    }

    /// Edit title/priority of a live activity.
    pub async fn update_details(&self, activity_id: Uuid, patch: ActivityPatch) -> Result<Activity> {
        if patch.is_empty() {
            return Err(TempoError::InvalidInput("no editable fields provided".into()));
        }
        if let Some(title) = &patch.title {
            if title.trim().is_empty() {
                return Err(TempoError::InvalidInput("activity title must not be empty".into()));
            }
        }
        let updated = self.activities.update_details(activity_id, patch).await?;
        self.publish_for(ActivityEventKind::DetailsUpdated, &updated, self.clock.now()).await;
        Ok(updated)
    }

    pub async fn get_activity(&self, id: Uuid) -> Result<Activity> {
        self.activities.fetch(id).await
    }

    pub async fn get_subtasks(&self, activity_id: Uuid) -> Result<Vec<Subtask>> {
        self.activities.fetch_subtasks(activity_id).await
    }

    pub async fn list_by_collaborator(&self, owner_id: Uuid) -> Result<Vec<Activity>> {
        self.activities.list_by_owner(owner_id).await
    }

    pub async fn list_by_sector(&self, sector_id: Uuid) -> Result<Vec<Activity>> {
        self.activities.list_by_sector(sector_id).await
    }

    /// Every activity; caller-side authorization gates this.
    pub async fn list_all(&self) -> Result<Vec<Activity>> {
        self.activities.list_all().await
    }

    pub async fn timeline(&self, activity_id: Uuid) -> Result<Vec<ActivityLogEntry>> {
        self.timeline.entries_for(activity_id).await
    }

    /// The open session for an activity, for client-side live displays.
    pub async fn open_session(&self, activity_id: Uuid) -> Result<Option<Session>> {
        self.sessions.open_session(activity_id).await
    }

    /// Accumulated total plus the open session's elapsed time, if any.
    pub async fn live_total(&self, activity_id: Uuid) -> Result<i64> {
        let activity = self.activities.fetch(activity_id).await?;
        self.sessions.live_total(&activity).await
    }

    async fn total_after_session_close(
        &self,
        activity: &Activity,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let session = self
            .sessions
            .open_session(activity.id)
            .await?
            .ok_or(TempoError::NoOpenSession { activity_id: activity.id })?;
        let duration = (now - session.started_at).num_seconds();
        if duration < 0 {
            return Err(TempoError::InvalidInterval(format!(
                "session close instant {now} precedes start {}",
                session.started_at
            )));
        }
        Ok(activity.total_seconds + duration)
    }

    async fn check_subtasks_complete(&self, activity: &Activity) -> Result<()> {
        if !activity.is_checklist() {
            return Ok(());
        }
        let subtasks = self.activities.fetch_subtasks(activity.id).await?;
        let remaining = subtasks.iter().filter(|subtask| !subtask.completed).count();
        if remaining > 0 {
            return Err(TempoError::IncompleteSubtasks { remaining });
        }
        Ok(())
    }

    async fn record_timeline(
        &self,
        activity: &Activity,
        acting_user: Uuid,
        action: ActivityAction,
        time_spent: Option<i64>,
    ) {
        let entry = ActivityLogEntry {
            id: Uuid::new_v4(),
            activity_id: activity.id,
            acting_user_id: acting_user,
            action,
            title_snapshot: activity.title.clone(),
            time_spent_seconds: time_spent,
            created_at: self.clock.now(),
        };
        if let Err(err) = self.timeline.append(entry).await {
            warn!(error = %err, activity_id = %activity.id, "failed to append timeline entry");
        }
    }

    async fn publish_for(&self, kind: ActivityEventKind, activity: &Activity, at: DateTime<Utc>) {
        match self.collaborators.fetch(activity.owner_id).await {
            Ok(owner) => self.publish(kind, activity, owner.sector_id, at),
            Err(err) => {
                warn!(error = %err, activity_id = %activity.id, "owner lookup failed, event dropped");
            }
        }
    }

    fn publish(
        &self,
        kind: ActivityEventKind,
        activity: &Activity,
        sector_id: Uuid,
        at: DateTime<Utc>,
    ) {
        self.publisher.publish(ActivityEvent {
            kind,
            activity: activity.clone(),
            sector_id,
            occurred_at: at,
        });
    }
}

fn validate_retroactive_range(
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<i64> {
    if ended_at <= started_at {
        return Err(TempoError::InvalidRetroactiveRange(
            "end instant must be after the start instant".into(),
        ));
    }
    if ended_at > now {
        return Err(TempoError::InvalidRetroactiveRange(
            "end instant must not be in the future".into(),
        ));
    }
    Ok((ended_at - started_at).num_seconds())
}

fn build_subtasks(activity: &Activity, titles: &[String]) -> Vec<Subtask> {
    if !activity.is_checklist() {
        return Vec::new();
    }
    titles
        .iter()
        .enumerate()
        .map(|(position, title)| Subtask {
            id: Uuid::new_v4(),
            activity_id: activity.id,
            title: title.clone(),
            completed: false,
            position: position as i32,
        })
        .collect()
}

fn timeline_action(target: ActivityStatus, updated: &Activity) -> (ActivityAction, Option<i64>) {
    match target {
        ActivityStatus::InProgress => (ActivityAction::Started, None),
        ActivityStatus::Paused => (ActivityAction::Paused, None),
        ActivityStatus::Completed => (ActivityAction::Completed, Some(updated.total_seconds)),
        ActivityStatus::Cancelled => (ActivityAction::Cancelled, None),
        // transitions into `next` never reach this point
        ActivityStatus::Next => (ActivityAction::Created, None),
    }
}
