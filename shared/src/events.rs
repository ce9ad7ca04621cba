//! Domain event publication over Redis pub/sub.
//!
//! Every write path in the replenishment engine (movement applied, sale completed/refunded,
//! GRN received, suggestion generated/approved, PO created) publishes one of these after its
//! transaction commits. Subscribers are out of scope here; this crate only produces events.

use crate::error::Result;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub id: Uuid,
    pub event_type: String,
    pub aggregate_id: Uuid,
    pub aggregate_type: String,
    pub store_id: String,
    pub data: serde_json::Value,
    pub metadata: EventMetadata,
    pub version: i32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    pub actor_id: Option<Uuid>,
    pub correlation_id: Uuid,
    pub causation_id: Option<Uuid>,
}

impl DomainEvent {
    pub fn builder(
        event_type: impl Into<String>,
        aggregate_id: Uuid,
        aggregate_type: impl Into<String>,
        store_id: impl Into<String>,
    ) -> DomainEventBuilder {
        DomainEventBuilder {
            event_type: event_type.into(),
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            store_id: store_id.into(),
            data: serde_json::Value::Null,
            metadata: EventMetadata {
                actor_id: None,
                correlation_id: Uuid::new_v4(),
                causation_id: None,
            },
            version: 1,
        }
    }

    pub fn topic(&self) -> String {
        format!("events.{}.{}", self.aggregate_type.to_lowercase(), self.event_type)
    }

    pub fn store_topic(&self) -> String {
        format!("events.store.{}.{}", self.store_id, self.event_type)
    }
}

pub struct DomainEventBuilder {
    event_type: String,
    aggregate_id: Uuid,
    aggregate_type: String,
    store_id: String,
    data: serde_json::Value,
    metadata: EventMetadata,
    version: i32,
}

impl DomainEventBuilder {
    pub fn data(mut self, data: impl Serialize) -> Result<Self> {
        self.data = serde_json::to_value(data)?;
        Ok(self)
    }

    pub fn actor_id(mut self, actor_id: Uuid) -> Self {
        self.metadata.actor_id = Some(actor_id);
        self
    }

    pub fn correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.metadata.correlation_id = correlation_id;
        self
    }

    pub fn causation_id(mut self, causation_id: Uuid) -> Self {
        self.metadata.causation_id = Some(causation_id);
        self
    }

    pub fn build(self) -> DomainEvent {
        DomainEvent {
            id: Uuid::new_v4(),
            event_type: self.event_type,
            aggregate_id: self.aggregate_id,
            aggregate_type: self.aggregate_type,
            store_id: self.store_id,
            data: self.data,
            metadata: self.metadata,
            version: self.version,
            occurred_at: Utc::now(),
        }
    }
}

/// Publishes domain events to Redis. Falls back to a no-op mock when Redis is
/// unreachable at startup so the engine keeps serving requests (see `main.rs`).
pub enum EventPublisher {
    Redis(ConnectionManager),
    Mock,
}

impl EventPublisher {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::Redis(conn))
    }

    pub fn mock() -> Self {
        Self::Mock
    }

    /// `ConnectionManager` is a cheap-to-clone handle onto a multiplexed connection, so
    /// publishing concurrently from many services does not need external locking.
    pub async fn publish(&self, event: &DomainEvent) -> Result<()> {
        let Self::Redis(conn) = self else {
            tracing::debug!(event_type = %event.event_type, "mock publisher dropping event");
            return Ok(());
        };
        let mut conn = conn.clone();

        let payload = serde_json::to_string(event)?;

        redis::cmd("PUBLISH")
            .arg(event.topic())
            .arg(&payload)
            .query_async::<_, i64>(&mut conn)
            .await?;

        redis::cmd("PUBLISH")
            .arg(event.store_topic())
            .arg(&payload)
            .query_async::<_, i64>(&mut conn)
            .await?;

        Ok(())
    }

    pub async fn publish_batch(&self, events: &[DomainEvent]) -> Result<()> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }

    pub async fn ping(&self) -> Result<()> {
        let Self::Redis(conn) = self else {
            return Ok(());
        };
        let mut conn = conn.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_store_topic() {
        let event = DomainEvent::builder("MovementApplied", Uuid::new_v4(), "Batch", "store-1")
            .data(serde_json::json!({"qty": 5}))
            .unwrap()
            .build();

        assert_eq!(event.topic(), "events.batch.MovementApplied");
        assert_eq!(event.store_topic(), "events.store.store-1.MovementApplied");
    }

    #[tokio::test]
    async fn mock_publisher_never_errors() {
        let publisher = EventPublisher::mock();
        let event = DomainEvent::builder("SuggestionGenerated", Uuid::new_v4(), "Suggestion", "store-1").build();
        publisher.publish(&event).await.unwrap();
        publisher.ping().await.unwrap();
    }
}
