//! Fire-and-forget publication of domain events to NATS.

use crate::domain::events::DomainEvent;

#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    /// Connects when a URL is given. A failed connection is logged and the
    /// service runs without event publication.
    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else { return Self::default() };
        match async_nats::connect(url).await {
            Ok(client) => {
                tracing::info!(%url, "connected to NATS");
                Self::new(Some(client))
            }
            Err(error) => {
                tracing::warn!(%url, %error, "NATS unavailable, events will not be published");
                Self::default()
            }
        }
    }

    /// Never fails the caller; problems are logged.
    pub async fn publish(&self, event: DomainEvent) {
        let Some(nats) = &self.nats else {
            tracing::debug!(subject = %event.subject(), "event dropped, no NATS client");
            return;
        };
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::error!(%error, "failed to encode event");
                return;
            }
        };
        let subject = event.subject();
        if let Err(error) = nats.publish(subject.clone(), payload.into()).await {
            tracing::warn!(%subject, %error, "failed to publish event");
        }
    }
}
