//! Shared helpers for infra integration tests.

use tempfile::TempDir;
use tempo_domain::{Collaborator, Config, DatabaseConfig, LogConfig};
use tempo_infra::AppContext;
use uuid::Uuid;

/// Fresh context over a throwaway database file.
pub fn test_context() -> (AppContext, TempDir) {
    let temp_dir = TempDir::new().expect("tempdir created");
    let config = Config {
        database: DatabaseConfig {
            path: temp_dir.path().join("tempo.db").to_string_lossy().into_owned(),
            pool_size: 4,
        },
        log: LogConfig::default(),
    };
    let context = AppContext::initialise(&config).expect("context initialised");
    (context, temp_dir)
}

/// Seed one collaborator in the given sector.
pub async fn seed_collaborator(context: &AppContext, sector_id: Uuid) -> Collaborator {
    let collaborator = Collaborator {
        id: Uuid::new_v4(),
        name: "integration user".to_string(),
        sector_id,
        is_admin: false,
    };
    context.sync_collaborator(collaborator.clone()).await.expect("collaborator synced");
    collaborator
}
