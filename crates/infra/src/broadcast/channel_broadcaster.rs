//! Channel-backed implementation of the event publisher port.
//!
//! Each subscriber owns the receiving half of an unbounded channel; the
//! broadcaster keeps the senders in a registry keyed by subscription id.
//! Publishing never blocks: a send to a dropped receiver marks the
//! subscription stale, and stale entries are pruned after the fan-out.

use std::collections::HashMap;
use std::sync::RwLock;

use tempo_core::EventPublisher;
use tempo_domain::{ActivityEvent, SubscriptionScope};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

struct SubscriberEntry {
    scope: SubscriptionScope,
    sender: mpsc::UnboundedSender<ActivityEvent>,
}

/// Live subscription handle. Dropping the receiver implicitly ends the
/// subscription; `unsubscribe` removes it eagerly.
pub struct Subscription {
    pub id: Uuid,
    pub scope: SubscriptionScope,
    pub receiver: mpsc::UnboundedReceiver<ActivityEvent>,
}

/// Fan-out registry of live subscribers, scoped by sector or admin role.
#[derive(Default)]
pub struct ChannelBroadcaster {
    subscribers: RwLock<HashMap<Uuid, SubscriberEntry>>,
}

impl ChannelBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber with the given scope.
    pub fn subscribe(&self, scope: SubscriptionScope) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.write_registry().insert(id, SubscriberEntry { scope, sender });
        debug!(subscription_id = %id, ?scope, "subscriber registered");
        Subscription { id, scope, receiver }
    }

    /// Remove a subscriber. Returns false when the id is unknown (already
    /// pruned or never registered).
    pub fn unsubscribe(&self, id: Uuid) -> bool {
        self.write_registry().remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.read_registry().len()
    }

    fn read_registry(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, SubscriberEntry>> {
        match self.subscribers.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("broadcaster registry lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_registry(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, SubscriberEntry>> {
        match self.subscribers.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("broadcaster registry lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl EventPublisher for ChannelBroadcaster {
    fn publish(&self, event: ActivityEvent) {
        let mut stale = Vec::new();
        {
            let registry = self.read_registry();
            for (id, entry) in registry.iter() {
                if !entry.scope.includes_sector(event.sector_id) {
                    continue;
                }
                if entry.sender.send(event.clone()).is_err() {
                    stale.push(*id);
                }
            }
        }
        if !stale.is_empty() {
            let mut registry = self.write_registry();
            for id in stale {
                registry.remove(&id);
                debug!(subscription_id = %id, "pruned disconnected subscriber");
            }
        }
    }
}
