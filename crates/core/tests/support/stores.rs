//! In-memory store implementing every core port.
//!
//! All state lives behind a single mutex, so the atomicity contracts
//! (status compare-and-set, single-active guard, adjustment append+update)
//! hold under one lock acquisition the way a database transaction would.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempo_core::{
    ActivityLogStore, ActivityStore, AdjustmentStore, CollaboratorStore, SessionStore,
    TransitionChange,
};
use tempo_domain::{
    Activity, ActivityLogEntry, ActivityPatch, ActivityStatus, Collaborator,
    Result as DomainResult, Session, Subtask, TempoError, TimeAdjustment,
};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    activities: HashMap<Uuid, Activity>,
    subtasks: HashMap<Uuid, Subtask>,
    sessions: Vec<Session>,
    adjustments: Vec<TimeAdjustment>,
    log: Vec<ActivityLogEntry>,
    collaborators: HashMap<Uuid, Collaborator>,
}

/// In-memory implementation of all core persistence ports.
#[derive(Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn seed_collaborator(&self, collaborator: Collaborator) {
        self.lock().collaborators.insert(collaborator.id, collaborator);
    }

    pub fn log_entries(&self) -> Vec<ActivityLogEntry> {
        self.lock().log.clone()
    }

    pub fn session_count(&self, activity_id: Uuid) -> usize {
        self.lock().sessions.iter().filter(|s| s.activity_id == activity_id).count()
    }

    pub fn recorded_sessions(&self, activity_id: Uuid) -> Vec<Session> {
        self.lock().sessions.iter().filter(|s| s.activity_id == activity_id).cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store lock")
    }
}

fn active_conflict(inner: &Inner, owner_id: Uuid, except: Uuid) -> Option<Uuid> {
    inner
        .activities
        .values()
        .find(|a| {
            a.owner_id == owner_id && a.status == ActivityStatus::InProgress && a.id != except
        })
        .map(|a| a.id)
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn insert(&self, activity: Activity, subtasks: Vec<Subtask>) -> DomainResult<()> {
        let mut inner = self.lock();
        if activity.status == ActivityStatus::InProgress {
            if let Some(active) = active_conflict(&inner, activity.owner_id, activity.id) {
                return Err(TempoError::AlreadyActive { active_activity_id: active });
            }
        }
        inner.activities.insert(activity.id, activity);
        for subtask in subtasks {
            inner.subtasks.insert(subtask.id, subtask);
        }
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> DomainResult<Activity> {
        self.lock()
            .activities
            .get(&id)
            .cloned()
            .ok_or_else(|| TempoError::NotFound(format!("activity {id}")))
    }

    async fn fetch_subtasks(&self, activity_id: Uuid) -> DomainResult<Vec<Subtask>> {
        let mut subtasks: Vec<Subtask> = self
            .lock()
            .subtasks
            .values()
            .filter(|subtask| subtask.activity_id == activity_id)
            .cloned()
            .collect();
        subtasks.sort_by_key(|subtask| subtask.position);
        Ok(subtasks)
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        expected: ActivityStatus,
        change: TransitionChange,
    ) -> DomainResult<Activity> {
        let mut inner = self.lock();
        let current = inner
            .activities
            .get(&id)
            .map(|activity| activity.status)
            .ok_or_else(|| TempoError::NotFound(format!("activity {id}")))?;
        if current != expected {
            return Err(TempoError::InvalidTransition { from: current, to: change.status });
        }
        if let Some(owner_id) = change.exclusive_for_owner {
            if let Some(active) = active_conflict(&inner, owner_id, id) {
                return Err(TempoError::AlreadyActive { active_activity_id: active });
            }
        }
        let activity = inner.activities.get_mut(&id).expect("activity present");
        change.apply(activity);
        Ok(activity.clone())
    }

    async fn update_details(&self, id: Uuid, patch: ActivityPatch) -> DomainResult<Activity> {
        let mut inner = self.lock();
        let activity = inner
            .activities
            .get_mut(&id)
            .ok_or_else(|| TempoError::NotFound(format!("activity {id}")))?;
        if !activity.status.allows_edits() {
            return Err(TempoError::ActivityLocked { status: activity.status });
        }
        if let Some(title) = patch.title {
            activity.title = title;
        }
        if let Some(priority) = patch.priority {
            activity.priority = priority;
        }
        Ok(activity.clone())
    }

    async fn set_subtask(&self, subtask_id: Uuid, completed: bool) -> DomainResult<Subtask> {
        let mut inner = self.lock();
        let activity_id = inner
            .subtasks
            .get(&subtask_id)
            .map(|subtask| subtask.activity_id)
            .ok_or_else(|| TempoError::NotFound(format!("subtask {subtask_id}")))?;
        let status = inner
            .activities
            .get(&activity_id)
            .map(|activity| activity.status)
            .ok_or_else(|| TempoError::NotFound(format!("activity {activity_id}")))?;
        if !status.allows_edits() {
            return Err(TempoError::ActivityLocked { status });
        }
        let subtask = inner.subtasks.get_mut(&subtask_id).expect("subtask present");
        subtask.completed = completed;
        Ok(subtask.clone())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> DomainResult<Vec<Activity>> {
        Ok(self
            .lock()
            .activities
            .values()
            .filter(|activity| activity.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn list_by_sector(&self, sector_id: Uuid) -> DomainResult<Vec<Activity>> {
        let inner = self.lock();
        Ok(inner
            .activities
            .values()
            .filter(|activity| {
                inner
                    .collaborators
                    .get(&activity.owner_id)
                    .is_some_and(|owner| owner.sector_id == sector_id)
            })
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> DomainResult<Vec<Activity>> {
        Ok(self.lock().activities.values().cloned().collect())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn open(&self, activity_id: Uuid, at: DateTime<Utc>) -> DomainResult<Session> {
        let mut inner = self.lock();
        if inner.sessions.iter().any(|s| s.activity_id == activity_id && s.is_open()) {
            return Err(TempoError::SessionAlreadyOpen { activity_id });
        }
        let session = Session {
            id: Uuid::new_v4(),
            activity_id,
            started_at: at,
            ended_at: None,
            duration_seconds: None,
        };
        inner.sessions.push(session.clone());
        Ok(session)
    }

    async fn close(&self, activity_id: Uuid, at: DateTime<Utc>) -> DomainResult<Session> {
        let mut inner = self.lock();
        let session = inner
            .sessions
            .iter_mut()
            .find(|s| s.activity_id == activity_id && s.is_open())
            .ok_or(TempoError::NoOpenSession { activity_id })?;
        let duration = (at - session.started_at).num_seconds();
        if duration < 0 {
            return Err(TempoError::InvalidInterval(format!(
                "close instant {at} precedes session start {}",
                session.started_at
            )));
        }
        session.ended_at = Some(at);
        session.duration_seconds = Some(duration);
        Ok(session.clone())
    }

    async fn open_session(&self, activity_id: Uuid) -> DomainResult<Option<Session>> {
        Ok(self
            .lock()
            .sessions
            .iter()
            .find(|s| s.activity_id == activity_id && s.is_open())
            .cloned())
    }

    async fn sessions_for(&self, activity_id: Uuid) -> DomainResult<Vec<Session>> {
        Ok(self
            .lock()
            .sessions
            .iter()
            .filter(|s| s.activity_id == activity_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AdjustmentStore for MemoryStore {
    async fn record(&self, adjustment: TimeAdjustment) -> DomainResult<Activity> {
        let mut inner = self.lock();
        let activity = inner
            .activities
            .get_mut(&adjustment.activity_id)
            .ok_or_else(|| TempoError::NotFound(format!("activity {}", adjustment.activity_id)))?;
        if activity.total_seconds != adjustment.previous_seconds {
            return Err(TempoError::Internal(
                "activity total changed concurrently with adjustment".into(),
            ));
        }
        activity.total_seconds = adjustment.new_seconds;
        let updated = activity.clone();
        inner.adjustments.push(adjustment);
        Ok(updated)
    }

    async fn entries_for(&self, activity_id: Uuid) -> DomainResult<Vec<TimeAdjustment>> {
        Ok(self
            .lock()
            .adjustments
            .iter()
            .filter(|entry| entry.activity_id == activity_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ActivityLogStore for MemoryStore {
    async fn append(&self, entry: ActivityLogEntry) -> DomainResult<()> {
        self.lock().log.push(entry);
        Ok(())
    }

    async fn entries_for(&self, activity_id: Uuid) -> DomainResult<Vec<ActivityLogEntry>> {
        Ok(self
            .lock()
            .log
            .iter()
            .filter(|entry| entry.activity_id == activity_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CollaboratorStore for MemoryStore {
    async fn fetch(&self, id: Uuid) -> DomainResult<Collaborator> {
        self.lock()
            .collaborators
            .get(&id)
            .cloned()
            .ok_or_else(|| TempoError::NotFound(format!("collaborator {id}")))
    }

    async fn insert(&self, collaborator: Collaborator) -> DomainResult<()> {
        self.lock().collaborators.insert(collaborator.id, collaborator);
        Ok(())
    }

    async fn list_by_sector(&self, sector_id: Uuid) -> DomainResult<Vec<Collaborator>> {
        Ok(self
            .lock()
            .collaborators
            .values()
            .filter(|collaborator| collaborator.sector_id == sector_id)
            .cloned()
            .collect())
    }
}

