//! GRN Ingestor: records receipt of goods, creating or merging batches (spec §4.11).

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use pharmos_shared::events::{DomainEvent, EventPublisher};

use crate::error::Result;
use crate::models::{MovementReference, MovementType, NewMovement};
use crate::repositories::{InventoryRepository, PurchaseOrderRepository};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGrnLine {
    pub product_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub batch_number: String,
    pub expiry_date: Option<NaiveDate>,
    pub qty: i64,
    pub unit_cost: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGrn {
    pub store_id: String,
    pub vat_rate: Option<Decimal>,
    pub actor_id: Option<Uuid>,
    pub lines: Vec<NewGrnLine>,
}

#[derive(Debug, Clone)]
pub struct GrnReceipt {
    pub grn_number: String,
    pub total_cost: Decimal,
    pub vat_amount: Decimal,
    pub total_with_vat: Decimal,
}

pub struct GrnIngestor {
    pool: PgPool,
    inventory: Arc<dyn InventoryRepository>,
    purchase_orders: Arc<dyn PurchaseOrderRepository>,
    events: Arc<EventPublisher>,
}

impl GrnIngestor {
    pub fn new(
        pool: PgPool,
        inventory: Arc<dyn InventoryRepository>,
        purchase_orders: Arc<dyn PurchaseOrderRepository>,
        events: Arc<EventPublisher>,
    ) -> Self {
        Self { pool, inventory, purchase_orders, events }
    }

    pub async fn receive(&self, grn: NewGrn) -> Result<GrnReceipt> {
        let mut tx = self.pool.begin().await?;

        let grn_number = self.purchase_orders.next_grn_number_in_tx(&mut tx, &grn.store_id).await?;
        let grn_id = Uuid::new_v4();
        let mut total_cost = Decimal::ZERO;

        for line in &grn.lines {
            let batch = self
                .inventory
                .find_or_create_batch_in_tx(
                    &mut tx,
                    line.product_id,
                    &grn.store_id,
                    line.supplier_id,
                    &line.batch_number,
                    line.expiry_date,
                    line.unit_cost,
                )
                .await?;

            let movement = NewMovement {
                batch_id: batch.id,
                product_id: line.product_id,
                store_id: grn.store_id.clone(),
                movement_type: MovementType::Receive,
                qty: line.qty,
                unit_cost: Some(line.unit_cost),
                actor_id: grn.actor_id,
                reference: MovementReference { table: "grn", id: grn_id },
            };
            self.inventory.apply_movement_in_tx(&mut tx, movement).await?;

            total_cost += line.unit_cost * Decimal::from(line.qty);
        }

        tx.commit().await?;

        let vat_amount = grn.vat_rate.map(|rate| total_cost * rate).unwrap_or(Decimal::ZERO);
        let total_with_vat = total_cost + vat_amount;

        if let Ok(builder) = DomainEvent::builder("grn_received", grn_id, "grn", grn.store_id.clone())
            .data(serde_json::json!({ "grn_number": grn_number, "total_cost": total_cost }))
        {
            if let Err(err) = self.events.publish(&builder.build()).await {
                tracing::warn!(%err, "failed to publish grn_received event");
            }
        }

        Ok(GrnReceipt { grn_number, total_cost, vat_amount, total_with_vat })
    }
}
