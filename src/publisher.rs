//! Best-effort delivery of domain events to NATS.

use tracing::{debug, warn};
use crate::domain::events::DomainEvent;

#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    /// A publisher that drops every event.
    pub fn disabled() -> Self { Self::default() }

    pub fn is_enabled(&self) -> bool { self.nats.is_some() }

    /// Publishes after the originating transaction has committed. Failures are
    /// logged and swallowed.
    pub async fn publish(&self, events: Vec<DomainEvent>) {
        let Some(client) = &self.nats else {
            debug!(count = events.len(), "event publishing disabled");
            return;
        };
        for event in events {
            let subject = event.subject();
            let payload = match serde_json::to_vec(&event) {
                Ok(payload) => payload,
                Err(e) => { warn!(subject, error = %e, "failed to encode event"); continue; }
            };
            if let Err(e) = client.publish(subject.to_string(), payload.into()).await {
                warn!(subject, error = %e, "failed to publish event");
            }
        }
    }
}
