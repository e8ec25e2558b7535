//! Recording publisher for asserting on broadcast behaviour.

use std::sync::Mutex;

use tempo_core::EventPublisher;
use tempo_domain::{ActivityEvent, ActivityEventKind};

/// Publisher that records every event it is handed.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<ActivityEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().expect("events lock").clone()
    }

    pub fn events_of_kind(&self, kind: ActivityEventKind) -> Vec<ActivityEvent> {
        self.events().into_iter().filter(|event| event.kind == kind).collect()
    }

    pub fn clear(&self) {
        self.events.lock().expect("events lock").clear();
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: ActivityEvent) {
        self.events.lock().expect("events lock").push(event);
    }
}
