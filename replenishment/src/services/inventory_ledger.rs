//! Thin orchestration over `InventoryRepository`: the only writer of batches and
//! movements (spec §5 shared-resource policy). Publishes a domain event after every write.

use std::sync::Arc;
use uuid::Uuid;

use pharmos_shared::events::{DomainEvent, EventPublisher};

use crate::error::Result;
use crate::models::Batch;
use crate::repositories::InventoryRepository;

pub struct InventoryLedger {
    repo: Arc<dyn InventoryRepository>,
    events: Arc<EventPublisher>,
}

impl InventoryLedger {
    pub fn new(repo: Arc<dyn InventoryRepository>, events: Arc<EventPublisher>) -> Self {
        Self { repo, events }
    }

    pub async fn current_stock(&self, product_id: Uuid, store_id: &str) -> Result<i64> {
        self.repo.current_stock(product_id, store_id).await
    }

    pub async fn batches_by_fefo(&self, product_id: Uuid, store_id: &str) -> Result<Vec<Batch>> {
        self.repo.batches_by_fefo(product_id, store_id).await
    }

    pub async fn publish_movement_applied(&self, store_id: &str, batch: &Batch) {
        let built = DomainEvent::builder("movement_applied", batch.id, "batch", store_id.to_string())
            .data(serde_json::json!({ "batch_id": batch.id, "qty_on_hand": batch.qty_on_hand }));
        let event = match built {
            Ok(builder) => builder.build(),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize movement_applied event payload");
                return;
            }
        };
        if let Err(err) = self.events.publish(&event).await {
            tracing::warn!(%err, "failed to publish movement_applied event");
        }
    }
}
