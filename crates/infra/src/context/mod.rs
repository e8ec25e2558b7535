//! Application context - dependency injection container
//!
//! Wires the SQLite stores, the channel broadcaster, and the system clock
//! into the core services. The embedding layer (HTTP handlers, desktop
//! shell, test harness) owns one `AppContext` and calls the services on it.

use std::sync::Arc;

use tempo_core::{
    ActivityService, Clock, SessionLedger, SystemClock, TimeAdjustmentService,
};
use tempo_domain::{Collaborator, Config, Result, SubscriptionScope};
use uuid::Uuid;

use crate::broadcast::{ChannelBroadcaster, Subscription};
use crate::database::{
    DbManager, SqliteActivityLogStore, SqliteActivityStore, SqliteAdjustmentStore,
    SqliteCollaboratorStore, SqliteSessionStore,
};

/// Fully wired engine over SQLite persistence.
pub struct AppContext {
    pub db: Arc<DbManager>,
    pub broadcaster: Arc<ChannelBroadcaster>,
    pub activities: Arc<ActivityService>,
    pub adjustments: Arc<TimeAdjustmentService>,
    pub sessions: Arc<SessionLedger>,
    collaborators: Arc<SqliteCollaboratorStore>,
}

impl AppContext {
    /// Build the context: open the pool, run migrations, wire the services.
    pub fn initialise(config: &Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let broadcaster = Arc::new(ChannelBroadcaster::new());

        let activity_store = Arc::new(SqliteActivityStore::new(db.clone()));
        let session_store = Arc::new(SqliteSessionStore::new(db.clone()));
        let adjustment_store = Arc::new(SqliteAdjustmentStore::new(db.clone()));
        let log_store = Arc::new(SqliteActivityLogStore::new(db.clone()));
        let collaborators = Arc::new(SqliteCollaboratorStore::new(db.clone()));

        let sessions = Arc::new(SessionLedger::new(session_store, clock.clone()));
        let activities = Arc::new(ActivityService::new(
            activity_store.clone(),
            collaborators.clone(),
            log_store,
            sessions.clone(),
            broadcaster.clone(),
            clock.clone(),
        ));
        let adjustments = Arc::new(TimeAdjustmentService::new(
            activity_store,
            adjustment_store,
            collaborators.clone(),
            broadcaster.clone(),
            clock,
        ));

        Ok(Self { db, broadcaster, activities, adjustments, sessions, collaborators })
    }

    /// Register a live subscriber with the given scope.
    pub fn subscribe(&self, scope: SubscriptionScope) -> Subscription {
        self.broadcaster.subscribe(scope)
    }

    /// Remove a live subscriber.
    pub fn unsubscribe(&self, id: Uuid) -> bool {
        self.broadcaster.unsubscribe(id)
    }

    /// Upsert a collaborator profile synced from the identity layer.
    pub async fn sync_collaborator(&self, collaborator: Collaborator) -> Result<()> {
        use tempo_core::CollaboratorStore as _;
        self.collaborators.insert(collaborator).await
    }
}
