//! Domain event publishing.
//!
//! Events are always logged. When a NATS connection is configured they are
//! also published as JSON on the event's subject; publish failures are logged
//! and never fail the request that raised the event.

use crate::domain::events::DomainEvent;

#[derive(Clone, Default)]
pub struct EventPublisher { nats: Option<async_nats::Client> }

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    /// Connect to NATS if a URL is given. A failed connection disables publishing.
    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else { return Self::default() };
        match async_nats::connect(url).await {
            Ok(client) => {
                tracing::info!(url, "connected to NATS");
                Self::new(Some(client))
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "NATS unavailable, events will only be logged");
                Self::default()
            }
        }
    }

    pub fn is_connected(&self) -> bool { self.nats.is_some() }

    pub async fn publish(&self, events: Vec<DomainEvent>) {
        for event in events {
            let subject = event.subject();
            tracing::info!(subject, event = ?event, "domain event");
            let Some(nats) = &self.nats else { continue };
            let payload = match serde_json::to_vec(&event) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(subject, error = %e, "failed to encode event");
                    continue;
                }
            };
            if let Err(e) = nats.publish(subject.to_string(), payload.into()).await {
                tracing::warn!(subject, error = %e, "failed to publish event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::ProductEvent;

    #[tokio::test]
    async fn test_publish_without_nats_is_a_no_op() {
        let events = EventPublisher::connect(None).await;
        assert!(!events.is_connected());
        events.publish(vec![DomainEvent::Product(ProductEvent::Deleted { product_id: "a".into() })]).await;
    }

    #[test]
    fn test_event_json_shape() {
        let event = DomainEvent::Product(ProductEvent::Created { product_id: "badam-250g".into() });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["aggregate"], "product");
        assert_eq!(json["event"], "created");
        assert_eq!(event.subject(), "storefront.products.created");
    }
}
