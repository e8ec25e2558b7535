//! SQLite-backed session store.
//!
//! A partial unique index on `sessions(activity_id) WHERE ended_at IS NULL`
//! backs the one-open-session invariant; the store still checks it inside
//! the transaction to fail with the domain error instead of a constraint
//! violation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tempo_core::SessionStore as SessionStorePort;
use tempo_domain::{Result as DomainResult, Session, TempoError};
use uuid::Uuid;

use super::manager::DbManager;
use super::{opt_ts_column, run_blocking, ts_column, uuid_column};
use crate::errors::InfraError;

/// Async session store backed by SQLite.
pub struct SqliteSessionStore {
    db: Arc<DbManager>,
}

impl SqliteSessionStore {
    /// Construct a store backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStorePort for SqliteSessionStore {
    async fn open(&self, activity_id: Uuid, at: DateTime<Utc>) -> DomainResult<Session> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let mut conn = db.get_connection()?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;

            if query_open_session(&tx, activity_id)?.is_some() {
                return Err(TempoError::SessionAlreadyOpen { activity_id });
            }

            let session = Session {
                id: Uuid::new_v4(),
                activity_id,
                started_at: at,
                ended_at: None,
                duration_seconds: None,
            };
            tx.execute(
                INSERT_SESSION_SQL,
                params![
                    session.id.to_string(),
                    session.activity_id.to_string(),
                    session.started_at.timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            tx.commit().map_err(map_sql_error)?;
            Ok(session)
        })
        .await
    }

    async fn close(&self, activity_id: Uuid, at: DateTime<Utc>) -> DomainResult<Session> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let mut conn = db.get_connection()?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;

            let mut session = query_open_session(&tx, activity_id)?
                .ok_or(TempoError::NoOpenSession { activity_id })?;
            let duration = (at - session.started_at).num_seconds();
            if duration < 0 {
                return Err(TempoError::InvalidInterval(format!(
                    "close instant {at} precedes session start {}",
                    session.started_at
                )));
            }

            tx.execute(
                CLOSE_SESSION_SQL,
                params![at.timestamp(), duration, session.id.to_string()],
            )
            .map_err(map_sql_error)?;
            tx.commit().map_err(map_sql_error)?;

            session.ended_at = Some(at);
            session.duration_seconds = Some(duration);
            Ok(session)
        })
        .await
    }

    async fn open_session(&self, activity_id: Uuid) -> DomainResult<Option<Session>> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let conn = db.get_connection()?;
            query_open_session(&conn, activity_id)
        })
        .await
    }

    async fn sessions_for(&self, activity_id: Uuid) -> DomainResult<Vec<Session>> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(SESSIONS_FOR_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![activity_id.to_string()], map_session_row)
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<Session>>>().map_err(map_sql_error)
        })
        .await
    }
}

const INSERT_SESSION_SQL: &str =
    "INSERT INTO sessions (id, activity_id, started_at, ended_at, duration_seconds)
     VALUES (?1, ?2, ?3, NULL, NULL)";

const CLOSE_SESSION_SQL: &str =
    "UPDATE sessions SET ended_at = ?1, duration_seconds = ?2 WHERE id = ?3";

const OPEN_SESSION_SQL: &str =
    "SELECT id, activity_id, started_at, ended_at, duration_seconds
     FROM sessions WHERE activity_id = ?1 AND ended_at IS NULL";

const SESSIONS_FOR_SQL: &str =
    "SELECT id, activity_id, started_at, ended_at, duration_seconds
     FROM sessions WHERE activity_id = ?1 ORDER BY started_at";

fn query_open_session(conn: &Connection, activity_id: Uuid) -> DomainResult<Option<Session>> {
    conn.query_row(OPEN_SESSION_SQL, params![activity_id.to_string()], map_session_row)
        .optional()
        .map_err(map_sql_error)
}

fn map_session_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: uuid_column(row, 0)?,
        activity_id: uuid_column(row, 1)?,
        started_at: ts_column(row, 2)?,
        ended_at: opt_ts_column(row, 3)?,
        duration_seconds: row.get(4)?,
    })
}

fn map_sql_error(err: rusqlite::Error) -> TempoError {
    TempoError::from(InfraError::from(err))
}
