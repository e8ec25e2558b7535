//! Shared test support for core integration tests.

pub mod clock;
pub mod events;
pub mod stores;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempo_core::{ActivityService, SessionLedger, TimeAdjustmentService};
use tempo_domain::{ActivityKind, ActivityStart, Collaborator, NewActivity, Priority};
use uuid::Uuid;

pub use clock::FixedClock;
pub use events::RecordingPublisher;
pub use stores::MemoryStore;

/// Unix instant all tests start from.
pub const T0: i64 = 1_700_000_000;

pub fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(T0, 0).expect("valid base timestamp")
}

/// Fully wired services over in-memory stores, one seeded collaborator.
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub publisher: Arc<RecordingPublisher>,
    pub activities: Arc<ActivityService>,
    pub adjustments: Arc<TimeAdjustmentService>,
    pub owner: Collaborator,
}

impl TestHarness {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let clock = Arc::new(FixedClock::new(t0()));
        let publisher = Arc::new(RecordingPublisher::default());

        let owner = Collaborator {
            id: Uuid::new_v4(),
            name: "ana".to_string(),
            sector_id: Uuid::new_v4(),
            is_admin: false,
        };
        store.seed_collaborator(owner.clone());

        let ledger = Arc::new(SessionLedger::new(store.clone(), clock.clone()));
        let activities = Arc::new(ActivityService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            ledger,
            publisher.clone(),
            clock.clone(),
        ));
        let adjustments = Arc::new(TimeAdjustmentService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            publisher.clone(),
            clock.clone(),
        ));

        Self { store, clock, publisher, activities, adjustments, owner }
    }

    /// Register another collaborator in the given sector.
    pub fn seed_collaborator(&self, name: &str, sector_id: Uuid) -> Collaborator {
        let collaborator = Collaborator {
            id: Uuid::new_v4(),
            name: name.to_string(),
            sector_id,
            is_admin: false,
        };
        self.store.seed_collaborator(collaborator.clone());
        collaborator
    }
}

pub fn queued_spec(owner_id: Uuid, title: &str) -> NewActivity {
    NewActivity {
        title: title.to_string(),
        kind: ActivityKind::Simple,
        priority: Priority::Medium,
        owner_id,
        subtasks: Vec::new(),
        start: ActivityStart::Queued,
    }
}

pub fn checklist_spec(owner_id: Uuid, title: &str, subtasks: &[&str]) -> NewActivity {
    NewActivity {
        title: title.to_string(),
        kind: ActivityKind::Checklist,
        priority: Priority::High,
        owner_id,
        subtasks: subtasks.iter().map(|title| (*title).to_string()).collect(),
        start: ActivityStart::Queued,
    }
}
