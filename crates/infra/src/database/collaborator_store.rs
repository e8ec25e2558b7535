//! SQLite-backed collaborator store.
//!
//! Profiles are synced from the identity layer, so inserts are upserts.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use tempo_core::CollaboratorStore as CollaboratorStorePort;
use tempo_domain::{Collaborator, Result as DomainResult, TempoError};
use uuid::Uuid;

use super::manager::DbManager;
use super::{run_blocking, uuid_column};
use crate::errors::InfraError;

/// Async collaborator store backed by SQLite.
pub struct SqliteCollaboratorStore {
    db: Arc<DbManager>,
}

impl SqliteCollaboratorStore {
    /// Construct a store backed by the shared database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CollaboratorStorePort for SqliteCollaboratorStore {
    async fn fetch(&self, id: Uuid) -> DomainResult<Collaborator> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let conn = db.get_connection()?;
            conn.query_row(FETCH_SQL, params![id.to_string()], map_collaborator_row)
                .optional()
                .map_err(map_sql_error)?
                .ok_or_else(|| TempoError::NotFound(format!("collaborator {id}")))
        })
        .await
    }

    async fn insert(&self, collaborator: Collaborator) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let conn = db.get_connection()?;
            conn.execute(
                UPSERT_SQL,
                params![
                    collaborator.id.to_string(),
                    collaborator.name,
                    collaborator.sector_id.to_string(),
                    i64::from(collaborator.is_admin),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
    }

    async fn list_by_sector(&self, sector_id: Uuid) -> DomainResult<Vec<Collaborator>> {
        let db = Arc::clone(&self.db);
        run_blocking(move || {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(LIST_BY_SECTOR_SQL).map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![sector_id.to_string()], map_collaborator_row)
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<Collaborator>>>().map_err(map_sql_error)
        })
        .await
    }
}

const FETCH_SQL: &str = "SELECT id, name, sector_id, is_admin FROM collaborators WHERE id = ?1";

const UPSERT_SQL: &str =
    "INSERT OR REPLACE INTO collaborators (id, name, sector_id, is_admin) VALUES (?1, ?2, ?3, ?4)";

const LIST_BY_SECTOR_SQL: &str =
    "SELECT id, name, sector_id, is_admin FROM collaborators WHERE sector_id = ?1 ORDER BY name";

fn map_collaborator_row(row: &Row<'_>) -> rusqlite::Result<Collaborator> {
    let is_admin: i64 = row.get(3)?;
    Ok(Collaborator {
        id: uuid_column(row, 0)?,
        name: row.get(1)?,
        sector_id: uuid_column(row, 2)?,
        is_admin: is_admin != 0,
    })
}

fn map_sql_error(err: rusqlite::Error) -> TempoError {
    TempoError::from(InfraError::from(err))
}
