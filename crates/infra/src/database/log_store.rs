//! SQLite-backed activity timeline store. Append-only.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Row};
use tempo_core::ActivityLogStore as ActivityLogStorePort;
use tempo_domain::{ActivityLogEntry, Result as DomainResult, TempoError};
use uuid::Uuid;

use super::manager::DbManager;
use super::{parsed_column, run_blocking, ts_column, uuid_column};
use crate::errors::InfraError;

/// Async timeline store backed by SQLite.
pub struct SqliteActivityLogStore {
    db: Arc<DbManager>,
}

impl SqliteActivityLogStore {
    /// Construct a store backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActivityLogStorePort for SqliteActivityLogStore {
    async fn append(&self, entry: ActivityLogEntry) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                INSERT_LOG_SQL,
                params![
                    entry.id.to_string(),
                    entry.activity_id.to_string(),
                    entry.acting_user_id.to_string(),
                    entry.action.as_str(),
                    entry.title_snapshot,
                    entry.time_spent_seconds,
                    entry.created_at.timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }

    async fn entries_for(&self, activity_id: Uuid) -> DomainResult<Vec<ActivityLogEntry>> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(ENTRIES_FOR_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![activity_id.to_string()], map_log_row)
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<ActivityLogEntry>>>().map_err(map_sql_error)
        })
        .await
    }
}

const INSERT_LOG_SQL: &str = "INSERT INTO activity_log (
        id, activity_id, acting_user_id, action, title_snapshot, time_spent_seconds, created_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const ENTRIES_FOR_SQL: &str =
    "SELECT id, activity_id, acting_user_id, action, title_snapshot, time_spent_seconds, created_at
     FROM activity_log WHERE activity_id = ?1 ORDER BY created_at, rowid";

fn map_log_row(row: &Row<'_>) -> rusqlite::Result<ActivityLogEntry> {
    Ok(ActivityLogEntry {
        id: uuid_column(row, 0)?,
        activity_id: uuid_column(row, 1)?,
        acting_user_id: uuid_column(row, 2)?,
        action: parsed_column(row, 3)?,
        title_snapshot: row.get(4)?,
        time_spent_seconds: row.get(5)?,
        created_at: ts_column(row, 6)?,
    })
}

fn map_sql_error(err: rusqlite::Error) -> TempoError {
    TempoError::from(InfraError::from(err))
}
