//! Port interface for event delivery

use tempo_domain::ActivityEvent;

/// Push-delivery interface toward live subscribers.
///
/// Delivery is best-effort and fire-and-forget: a disconnected or slow
/// subscriber must never block or fail the originating mutation, so this
/// port is infallible and must not perform blocking work. Services publish
/// only after the mutation has committed.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: ActivityEvent);
}

/// Publisher that drops every event. Useful for tests and tooling that do
/// not care about notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: ActivityEvent) {}
}
