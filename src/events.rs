//! Domain event publishing.
//!
//! Events go to NATS as JSON when a client is configured. Publishing never
//! fails the operation that raised the event.

use async_nats::Client;
use tracing::{info, warn};
use crate::domain::events::DomainEvent;

#[derive(Clone, Debug)]
pub struct EventPublisher {
    nats: Option<Client>,
    prefix: String,
}

impl EventPublisher {
    pub fn disabled() -> Self { Self { nats: None, prefix: "areca".into() } }

    pub fn nats(client: Client, prefix: impl Into<String>) -> Self { Self { nats: Some(client), prefix: prefix.into() } }

    pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self, async_nats::ConnectError> {
        let client = async_nats::connect(url).await?;
        info!(url, "connected to nats");
        Ok(Self::nats(client, prefix))
    }

    pub fn subject_for(&self, event: &DomainEvent) -> String { format!("{}.{}", self.prefix, event.subject()) }

    pub async fn publish(&self, namespace: &str, events: Vec<DomainEvent>) {
        for event in events {
            let subject = self.subject_for(&event);
            info!(namespace, %subject, ?event, "domain event");
            let Some(client) = &self.nats else { continue };
            let payload = serde_json::json!({ "namespace": namespace, "payload": event });
            let bytes = match serde_json::to_vec(&payload) {
                Ok(bytes) => bytes,
                Err(e) => { warn!(%subject, error = %e, "failed to encode event"); continue; }
            };
            if let Err(e) = client.publish(subject.clone(), bytes.into()).await {
                warn!(%subject, error = %e, "failed to publish event");
            }
        }
    }
}
