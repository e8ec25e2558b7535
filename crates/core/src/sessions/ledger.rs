//! Session ledger service

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempo_domain::{Activity, Result, Session};
use uuid::Uuid;

use super::ports::SessionStore;
use crate::clock::Clock;

/// Owns the single open-ended timing interval per activity.
///
/// The durable counter (`Activity::total_seconds`) and the ephemeral open
/// interval are kept separate: the counter survives restarts and is
/// authoritative for reporting, while the open interval lets any client
/// compute a live elapsed display locally from
/// `total + (now - session.started_at)`.
pub struct SessionLedger {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl SessionLedger {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Open a session for an activity entering `in_progress`.
    pub async fn open(&self, activity_id: Uuid, at: DateTime<Utc>) -> Result<Session> {
        self.store.open(activity_id, at).await
    }

    /// Close the open session for an activity leaving `in_progress`.
    pub async fn close(&self, activity_id: Uuid, at: DateTime<Utc>) -> Result<Session> {
        self.store.close(activity_id, at).await
    }

    /// The open session for an activity, if any.
    pub async fn open_session(&self, activity_id: Uuid) -> Result<Option<Session>> {
        self.store.open_session(activity_id).await
    }

    /// All sessions recorded for an activity, oldest first.
    pub async fn sessions_for(&self, activity_id: Uuid) -> Result<Vec<Session>> {
        self.store.sessions_for(activity_id).await
    }

    /// Accumulated total plus the elapsed time of the open session, if any.
    pub async fn live_total(&self, activity: &Activity) -> Result<i64> {
        match self.store.open_session(activity.id).await? {
            Some(session) => {
                Ok(activity.total_seconds + session.elapsed_seconds(self.clock.now()))
            }
            None => Ok(activity.total_seconds),
        }
    }
}
