//! Port interface for session persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempo_domain::{Result, Session};
use uuid::Uuid;

/// Trait for persisting timing sessions.
///
/// Invariant: at most one open session per activity. The store enforces it
/// on `open`; violations indicate a bug or a race the transition guard
/// should have prevented, so both failure variants are treated as fatal by
/// callers.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Open a session at `at`, failing `SessionAlreadyOpen` if one exists.
    async fn open(&self, activity_id: Uuid, at: DateTime<Utc>) -> Result<Session>;

    /// Close the open session at `at`, computing its duration.
    ///
    /// Fails `NoOpenSession` if none exists and `InvalidInterval` when `at`
    /// precedes the session start (clock or input error; never clamped).
    async fn close(&self, activity_id: Uuid, at: DateTime<Utc>) -> Result<Session>;

    /// The open session for an activity, if any.
    async fn open_session(&self, activity_id: Uuid) -> Result<Option<Session>>;

    /// All sessions for an activity, oldest first.
    async fn sessions_for(&self, activity_id: Uuid) -> Result<Vec<Session>>;
}
