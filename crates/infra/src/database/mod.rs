//! SQLite persistence adapters
//!
//! One store per core port, all sharing the pooled connection manager.
//! Timestamps are stored as unix seconds, ids and enums as TEXT.

pub mod activity_store;
pub mod adjustment_store;
pub mod collaborator_store;
pub mod log_store;
pub mod manager;
pub mod session_store;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use tempo_domain::{Result, TempoError};
use tokio::task;
use uuid::Uuid;

pub use activity_store::SqliteActivityStore;
pub use adjustment_store::SqliteAdjustmentStore;
pub use collaborator_store::SqliteCollaboratorStore;
pub use log_store::SqliteActivityLogStore;
pub use manager::DbManager;
pub use session_store::SqliteSessionStore;

pub(crate) fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let value: String = row.get(idx)?;
    Uuid::parse_str(&value)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

pub(crate) fn parsed_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = TempoError>,
{
    let value: String = row.get(idx)?;
    value
        .parse::<T>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

pub(crate) fn ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let seconds: i64 = row.get(idx)?;
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp {seconds} out of range").into(),
        )
    })
}

pub(crate) fn opt_ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let seconds: Option<i64> = row.get(idx)?;
    seconds.map(|seconds| ts_column_value(idx, seconds)).transpose()
}

fn ts_column_value(idx: usize, seconds: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp {seconds} out of range").into(),
        )
    })
}

pub(crate) fn map_join_error(err: task::JoinError) -> TempoError {
    if err.is_cancelled() {
        TempoError::Internal("blocking database task cancelled".into())
    } else {
        TempoError::Internal(format!("blocking database task failed: {err}"))
    }
}

/// Run a blocking database closure on the tokio blocking pool.
pub(crate) async fn run_blocking<T, F>(func: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    task::spawn_blocking(func).await.map_err(map_join_error)?
}
