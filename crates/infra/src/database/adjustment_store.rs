//! SQLite-backed time-adjustment store.
//!
//! The ledger append and the total update happen in one transaction: no
//! reader can observe a new total without its matching audit record.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tempo_core::AdjustmentStore as AdjustmentStorePort;
use tempo_domain::{Activity, Result as DomainResult, TempoError, TimeAdjustment};
use uuid::Uuid;

use super::manager::DbManager;
use super::{run_blocking, ts_column, uuid_column};
use crate::errors::InfraError;

/// Async adjustment store backed by SQLite.
pub struct SqliteAdjustmentStore {
    db: Arc<DbManager>,
}

impl SqliteAdjustmentStore {
    /// Construct a store backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AdjustmentStorePort for SqliteAdjustmentStore {
    async fn record(&self, adjustment: TimeAdjustment) -> DomainResult<Activity> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let mut conn = db.get_connection()?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;

            let current_total: i64 = tx
                .query_row(
                    "SELECT total_seconds FROM activities WHERE id = ?1",
                    params![adjustment.activity_id.to_string()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(map_sql_error)?
                .ok_or_else(|| {
                    TempoError::NotFound(format!("activity {}", adjustment.activity_id))
                })?;
            if current_total != adjustment.previous_seconds {
                return Err(TempoError::Internal(
                    "activity total changed concurrently with adjustment".into(),
                ));
            }

            tx.execute(
                INSERT_ADJUSTMENT_SQL,
                params![
                    adjustment.id.to_string(),
                    adjustment.activity_id.to_string(),
                    adjustment.acting_user_id.to_string(),
                    adjustment.previous_seconds,
                    adjustment.new_seconds,
                    adjustment.reason,
                    adjustment.created_at.timestamp(),
                ],
            )
            .map_err(map_sql_error)?;
            tx.execute(
                "UPDATE activities SET total_seconds = ?1 WHERE id = ?2",
                params![adjustment.new_seconds, adjustment.activity_id.to_string()],
            )
            .map_err(map_sql_error)?;

            let updated = super::activity_store::query_activity(&tx, adjustment.activity_id)?
                .ok_or_else(|| {
                    TempoError::NotFound(format!("activity {}", adjustment.activity_id))
                })?;
            tx.commit().map_err(map_sql_error)?;
            Ok(updated)
        })
        .await
    }

    async fn entries_for(&self, activity_id: Uuid) -> DomainResult<Vec<TimeAdjustment>> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let conn = db.get_connection()?;
            query_adjustments(&conn, activity_id)
        })
        .await
    }
}

const INSERT_ADJUSTMENT_SQL: &str = "INSERT INTO time_adjustments (
        id, activity_id, acting_user_id, previous_seconds, new_seconds, reason, created_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const ADJUSTMENTS_FOR_SQL: &str =
    "SELECT id, activity_id, acting_user_id, previous_seconds, new_seconds, reason, created_at
     FROM time_adjustments WHERE activity_id = ?1 ORDER BY created_at, rowid";

fn query_adjustments(conn: &Connection, activity_id: Uuid) -> DomainResult<Vec<TimeAdjustment>> {
    let mut stmt = conn.prepare(ADJUSTMENTS_FOR_SQL).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params![activity_id.to_string()], map_adjustment_row)
        .map_err(map_sql_error)?;
    rows.collect::<rusqlite::Result<Vec<TimeAdjustment>>>().map_err(map_sql_error)
}

fn map_adjustment_row(row: &Row<'_>) -> rusqlite::Result<TimeAdjustment> {
    Ok(TimeAdjustment {
        id: uuid_column(row, 0)?,
        activity_id: uuid_column(row, 1)?,
        acting_user_id: uuid_column(row, 2)?,
        previous_seconds: row.get(3)?,
        new_seconds: row.get(4)?,
        reason: row.get(5)?,
        created_at: ts_column(row, 6)?,
    })
}

fn map_sql_error(err: rusqlite::Error) -> TempoError {
    TempoError::from(InfraError::from(err))
}
