//! SQLite-backed activity store.
//!
//! Implements the `ActivityStore` port, including the two atomicity
//! contracts: status changes are compare-and-set inside an immediate
//! transaction, and the single-active-per-owner guard is checked in the
//! same transaction that writes the new status. A partial unique index on
//! `activities(owner_id) WHERE status = 'in_progress'` backs the guard at
//! the storage level.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql, TransactionBehavior};
use tempo_core::{ActivityStore as ActivityStorePort, TransitionChange};
use tempo_domain::{
    Activity, ActivityPatch, ActivityStatus, Result as DomainResult, Subtask, TempoError,
};
use uuid::Uuid;

use super::manager::DbManager;
use super::{opt_ts_column, parsed_column, run_blocking, ts_column, uuid_column};
use crate::errors::InfraError;

/// Async activity store backed by SQLite.
pub struct SqliteActivityStore {
    db: Arc<DbManager>,
}

impl SqliteActivityStore {
    /// Construct a store backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActivityStorePort for SqliteActivityStore {
    async fn insert(&self, activity: Activity, subtasks: Vec<Subtask>) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let mut conn = db.get_connection()?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;

            if activity.status == ActivityStatus::InProgress {
                if let Some(active_id) = find_active_conflict(&tx, activity.owner_id, activity.id)? {
                    return Err(TempoError::AlreadyActive { active_activity_id: active_id });
                }
            }

            insert_activity(&tx, &activity)?;
            for subtask in &subtasks {
                insert_subtask(&tx, subtask)?;
            }
            tx.commit().map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }

    async fn fetch(&self, id: Uuid) -> DomainResult<Activity> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let conn = db.get_connection()?;
            query_activity(&conn, id)?.ok_or_else(|| activity_not_found(id))
        })
        .await
    }

    async fn fetch_subtasks(&self, activity_id: Uuid) -> DomainResult<Vec<Subtask>> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let conn = db.get_connection()?;
            query_subtasks(&conn, activity_id)
        })
        .await
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        expected: ActivityStatus,
        change: TransitionChange,
    ) -> DomainResult<Activity> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let mut conn = db.get_connection()?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;

            let mut activity = query_activity(&tx, id)?.ok_or_else(|| activity_not_found(id))?;
            if activity.status != expected {
                return Err(TempoError::InvalidTransition {
                    from: activity.status,
                    to: change.status,
                });
            }
            if let Some(owner_id) = change.exclusive_for_owner {
                if let Some(active_id) = find_active_conflict(&tx, owner_id, id)? {
                    return Err(TempoError::AlreadyActive { active_activity_id: active_id });
                }
            }

            change.apply(&mut activity);
            write_activity(&tx, &activity)?;
            tx.commit().map_err(map_sql_error)?;
            Ok(activity)
        })
        .await
    }

    async fn update_details(&self, id: Uuid, patch: ActivityPatch) -> DomainResult<Activity> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let mut conn = db.get_connection()?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;

            let mut activity = query_activity(&tx, id)?.ok_or_else(|| activity_not_found(id))?;
            if !activity.status.allows_edits() {
                return Err(TempoError::ActivityLocked { status: activity.status });
            }
            if let Some(title) = patch.title {
                activity.title = title;
            }
            if let Some(priority) = patch.priority {
                activity.priority = priority;
            }
            write_activity(&tx, &activity)?;
            tx.commit().map_err(map_sql_error)?;
            Ok(activity)
        })
        .await
    }

    async fn set_subtask(&self, subtask_id: Uuid, completed: bool) -> DomainResult<Subtask> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let mut conn = db.get_connection()?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;

            let mut subtask = query_subtask(&tx, subtask_id)?
                .ok_or_else(|| TempoError::NotFound(format!("subtask {subtask_id}")))?;
            let parent = query_activity(&tx, subtask.activity_id)?
                .ok_or_else(|| activity_not_found(subtask.activity_id))?;
            if !parent.status.allows_edits() {
                return Err(TempoError::ActivityLocked { status: parent.status });
            }

            tx.execute(
                UPDATE_SUBTASK_SQL,
                params![i64::from(completed), subtask_id.to_string()],
            )
            .map_err(map_sql_error)?;
            tx.commit().map_err(map_sql_error)?;

            subtask.completed = completed;
            Ok(subtask)
        })
        .await
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> DomainResult<Vec<Activity>> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(LIST_BY_OWNER_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![owner_id.to_string()], map_activity_row)
                .map_err(map_sql_error)?;
            collect_rows(rows)
        })
        .await
    }

    async fn list_by_sector(&self, sector_id: Uuid) -> DomainResult<Vec<Activity>> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(LIST_BY_SECTOR_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![sector_id.to_string()], map_activity_row)
                .map_err(map_sql_error)?;
            collect_rows(rows)
        })
        .await
    }

    async fn list_all(&self) -> DomainResult<Vec<Activity>> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(LIST_ALL_SQL).map_err(map_sql_error)?;
            let rows = stmt.query_map([], map_activity_row).map_err(map_sql_error)?;
            collect_rows(rows)
        })
        .await
    }
}

const ACTIVITY_COLUMNS: &str = "id, title, kind, priority, status, total_seconds, owner_id,
        started_at, paused_at, completed_at, cancelled_at,
        cancel_reason, completion_notes, evidence_ref, created_at";

const INSERT_ACTIVITY_SQL: &str = "INSERT INTO activities (
        id, title, kind, priority, status, total_seconds, owner_id,
        started_at, paused_at, completed_at, cancelled_at,
        cancel_reason, completion_notes, evidence_ref, created_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)";

const UPDATE_ACTIVITY_SQL: &str = "UPDATE activities SET
        title = ?2, kind = ?3, priority = ?4, status = ?5, total_seconds = ?6,
        owner_id = ?7, started_at = ?8, paused_at = ?9, completed_at = ?10,
        cancelled_at = ?11, cancel_reason = ?12, completion_notes = ?13,
        evidence_ref = ?14, created_at = ?15
    WHERE id = ?1";

const FIND_ACTIVE_CONFLICT_SQL: &str =
    "SELECT id FROM activities WHERE owner_id = ?1 AND status = 'in_progress' AND id != ?2 LIMIT 1";

const INSERT_SUBTASK_SQL: &str = "INSERT INTO subtasks (id, activity_id, title, completed, position)
    VALUES (?1, ?2, ?3, ?4, ?5)";

const SELECT_SUBTASK_SQL: &str =
    "SELECT id, activity_id, title, completed, position FROM subtasks WHERE id = ?1";

const SELECT_SUBTASKS_SQL: &str =
    "SELECT id, activity_id, title, completed, position FROM subtasks
     WHERE activity_id = ?1 ORDER BY position";

const UPDATE_SUBTASK_SQL: &str = "UPDATE subtasks SET completed = ?1 WHERE id = ?2";

const LIST_BY_OWNER_SQL: &str = "SELECT id, title, kind, priority, status, total_seconds, owner_id,
        started_at, paused_at, completed_at, cancelled_at,
        cancel_reason, completion_notes, evidence_ref, created_at
    FROM activities WHERE owner_id = ?1 ORDER BY created_at";

const LIST_BY_SECTOR_SQL: &str =
    "SELECT a.id, a.title, a.kind, a.priority, a.status, a.total_seconds, a.owner_id,
        a.started_at, a.paused_at, a.completed_at, a.cancelled_at,
        a.cancel_reason, a.completion_notes, a.evidence_ref, a.created_at
    FROM activities a
    JOIN collaborators c ON c.id = a.owner_id
    WHERE c.sector_id = ?1 ORDER BY a.created_at";

const LIST_ALL_SQL: &str = "SELECT id, title, kind, priority, status, total_seconds, owner_id,
        started_at, paused_at, completed_at, cancelled_at,
        cancel_reason, completion_notes, evidence_ref, created_at
    FROM activities ORDER BY created_at";

pub(crate) fn query_activity(conn: &Connection, id: Uuid) -> DomainResult<Option<Activity>> {
    conn.query_row(
        &format!("SELECT {ACTIVITY_COLUMNS} FROM activities WHERE id = ?1"),
        params![id.to_string()],
        map_activity_row,
    )
    .optional()
    .map_err(map_sql_error)
}

fn find_active_conflict(
    conn: &Connection,
    owner_id: Uuid,
    except: Uuid,
) -> DomainResult<Option<Uuid>> {
    let id: Option<String> = conn
        .query_row(
            FIND_ACTIVE_CONFLICT_SQL,
            params![owner_id.to_string(), except.to_string()],
            |row| row.get(0),
        )
        .optional()
        .map_err(map_sql_error)?;
    match id {
        Some(id) => Uuid::parse_str(&id)
            .map(Some)
            .map_err(|err| TempoError::Internal(format!("malformed activity id in store: {err}"))),
        None => Ok(None),
    }
}

fn insert_activity(conn: &Connection, activity: &Activity) -> DomainResult<()> {
    write_activity_row(conn, INSERT_ACTIVITY_SQL, activity)
}

fn write_activity(conn: &Connection, activity: &Activity) -> DomainResult<()> {
    write_activity_row(conn, UPDATE_ACTIVITY_SQL, activity)
}

fn write_activity_row(conn: &Connection, sql: &str, activity: &Activity) -> DomainResult<()> {
    let id = activity.id.to_string();
    let kind = activity.kind.as_str();
    let priority = activity.priority.as_str();
    let status = activity.status.as_str();
    let owner_id = activity.owner_id.to_string();
    let started_at = activity.started_at.map(|at| at.timestamp());
    let paused_at = activity.paused_at.map(|at| at.timestamp());
    let completed_at = activity.completed_at.map(|at| at.timestamp());
    let cancelled_at = activity.cancelled_at.map(|at| at.timestamp());
    let created_at = activity.created_at.timestamp();

    let params: [&dyn ToSql; 15] = [
        &id,
        &activity.title,
        &kind,
        &priority,
        &status,
        &activity.total_seconds,
        &owner_id,
        &started_at,
        &paused_at,
        &completed_at,
        &cancelled_at,
        &activity.cancel_reason,
        &activity.completion_notes,
        &activity.evidence_ref,
        &created_at,
    ];

    conn.execute(sql, params.as_slice()).map_err(map_sql_error)?;
    Ok(())
}

fn insert_subtask(conn: &Connection, subtask: &Subtask) -> DomainResult<()> {
    conn.execute(
        INSERT_SUBTASK_SQL,
        params![
            subtask.id.to_string(),
            subtask.activity_id.to_string(),
            subtask.title,
            i64::from(subtask.completed),
            subtask.position,
        ],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

fn query_subtask(conn: &Connection, id: Uuid) -> DomainResult<Option<Subtask>> {
    conn.query_row(SELECT_SUBTASK_SQL, params![id.to_string()], map_subtask_row)
        .optional()
        .map_err(map_sql_error)
}

fn query_subtasks(conn: &Connection, activity_id: Uuid) -> DomainResult<Vec<Subtask>> {
    let mut stmt = conn.prepare(SELECT_SUBTASKS_SQL).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params![activity_id.to_string()], map_subtask_row)
        .map_err(map_sql_error)?;
    collect_rows(rows)
}

fn map_activity_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: uuid_column(row, 0)?,
        title: row.get(1)?,
        kind: parsed_column(row, 2)?,
        priority: parsed_column(row, 3)?,
        status: parsed_column(row, 4)?,
        total_seconds: row.get(5)?,
        owner_id: uuid_column(row, 6)?,
        started_at: opt_ts_column(row, 7)?,
        paused_at: opt_ts_column(row, 8)?,
        completed_at: opt_ts_column(row, 9)?,
        cancelled_at: opt_ts_column(row, 10)?,
        cancel_reason: row.get(11)?,
        completion_notes: row.get(12)?,
        evidence_ref: row.get(13)?,
        created_at: ts_column(row, 14)?,
    })
}

fn map_subtask_row(row: &Row<'_>) -> rusqlite::Result<Subtask> {
    let completed: i64 = row.get(3)?;
    Ok(Subtask {
        id: uuid_column(row, 0)?,
        activity_id: uuid_column(row, 1)?,
        title: row.get(2)?,
        completed: completed != 0,
        position: row.get(4)?,
    })
}

fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
) -> DomainResult<Vec<T>> {
    rows.collect::<rusqlite::Result<Vec<T>>>().map_err(map_sql_error)
}

fn activity_not_found(id: Uuid) -> TempoError {
    TempoError::NotFound(format!("activity {id}"))
}

fn map_sql_error(err: rusqlite::Error) -> TempoError {
    TempoError::from(InfraError::from(err))
}
