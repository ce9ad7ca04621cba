//! FEFO Sale Allocator: consumes stock in first-expiry-first-out order on sale creation,
//! and reverses it on refund (spec §4.10). The only writer allowed to turn a `NewSale`
//! into persisted sale rows; batch/movement writes still go through `InventoryRepository`.

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use pharmos_shared::events::{DomainEvent, EventPublisher};

use crate::error::{Error, Result};
use crate::models::{
    MovementReference, MovementType, NewMovement, NewSale, Sale, SaleLine, SaleStatus,
};
use crate::repositories::{InventoryRepository, SalesRepository};
use crate::retry;

pub struct FefoAllocator {
    pool: PgPool,
    inventory: Arc<dyn InventoryRepository>,
    sales: Arc<dyn SalesRepository>,
    events: Arc<EventPublisher>,
}

impl FefoAllocator {
    pub fn new(
        pool: PgPool,
        inventory: Arc<dyn InventoryRepository>,
        sales: Arc<dyn SalesRepository>,
        events: Arc<EventPublisher>,
    ) -> Self {
        Self { pool, inventory, sales, events }
    }

    pub async fn create_sale(&self, sale_number: String, new_sale: NewSale) -> Result<Sale> {
        let mut tx = self.pool.begin().await?;

        let sale_id = Uuid::new_v4();
        let mut lines = Vec::with_capacity(new_sale.lines.len());
        let mut subtotal = Decimal::ZERO;
        let mut tax_total = Decimal::ZERO;
        let mut discount_total = Decimal::ZERO;

        for requested in &new_sale.lines {
            let batches = self
                .inventory
                .batches_by_fefo(requested.product_id, &new_sale.store_id)
                .await?;

            let available: i64 = batches.iter().map(|b| b.qty_on_hand).sum();
            if available < requested.qty {
                return Err(Error::InsufficientStock {
                    product_id: requested.product_id,
                    requested: requested.qty,
                    available,
                });
            }

            let mut remaining = requested.qty;
            let mut first_batch_id = None;

            for batch in batches {
                if remaining == 0 {
                    break;
                }
                let take = remaining.min(batch.qty_on_hand);
                if take == 0 {
                    continue;
                }

                let movement = NewMovement {
                    batch_id: batch.id,
                    product_id: requested.product_id,
                    store_id: new_sale.store_id.clone(),
                    movement_type: MovementType::Sale,
                    qty: -take,
                    unit_cost: Some(batch.unit_cost),
                    actor_id: Some(new_sale.cashier_id),
                    reference: MovementReference { table: "sales", id: sale_id },
                };
                self.inventory.apply_movement_in_tx(&mut tx, movement).await?;

                if first_batch_id.is_none() {
                    first_batch_id = Some(batch.id);
                }
                remaining -= take;
            }

            let first_batch_id = first_batch_id.expect("availability check guarantees at least one batch");

            let gross = requested.unit_price * Decimal::from(requested.qty);
            let tax = gross * requested.tax_rate;
            let discount = gross * requested.discount;
            let line_total = gross + tax - discount;

            subtotal += gross;
            tax_total += tax;
            discount_total += discount;

            lines.push(SaleLine {
                id: Uuid::new_v4(),
                sale_id,
                product_id: requested.product_id,
                batch_id: first_batch_id,
                qty: requested.qty,
                unit_price: requested.unit_price,
                tax_rate: requested.tax_rate,
                discount: requested.discount,
                line_total,
            });
        }

        let total = subtotal + tax_total - discount_total;
        let change = new_sale.paid - total;

        let sale = Sale {
            id: sale_id,
            sale_number,
            store_id: new_sale.store_id.clone(),
            cashier_id: new_sale.cashier_id,
            subtotal,
            tax_total,
            discount_total,
            total,
            paid: new_sale.paid,
            change,
            payment_method: new_sale.payment_method.clone(),
            status: SaleStatus::Completed,
            created_at: chrono::Utc::now(),
        };

        self.sales.insert_sale_in_tx(&mut tx, &sale).await?;
        for line in &lines {
            self.sales.insert_sale_line_in_tx(&mut tx, line).await?;
        }

        tx.commit().await?;

        if let Ok(builder) = DomainEvent::builder("sale_completed", sale.id, "sale", sale.store_id.clone())
            .data(serde_json::json!({ "total": sale.total, "line_count": lines.len() }))
        {
            if let Err(err) = self.events.publish(&builder.build()).await {
                tracing::warn!(%err, "failed to publish sale_completed event");
            }
        }

        Ok(sale)
    }

    /// Idempotent: refunding an already-REFUNDED sale fails with `AlreadyRefunded`. Retries
    /// up to 3 times with jittered backoff if the row lock loses a race to another refund.
    pub async fn refund_sale(&self, sale_id: Uuid, actor_id: Option<Uuid>) -> Result<Sale> {
        retry::on_concurrent_modification(|| self.try_refund_sale(sale_id, actor_id)).await
    }

    async fn try_refund_sale(&self, sale_id: Uuid, actor_id: Option<Uuid>) -> Result<Sale> {
        let mut tx = self.pool.begin().await?;

        let sale = self
            .sales
            .sale_by_id_for_update(&mut tx, sale_id)
            .await?
            .ok_or(Error::NotFound { entity: "sale", id: sale_id.to_string() })?;

        if sale.status == SaleStatus::Refunded {
            return Err(Error::AlreadyRefunded { sale_id });
        }

        let lines = self.sales.sale_lines(sale_id).await?;
        for line in &lines {
            let movement = NewMovement {
                batch_id: line.batch_id,
                product_id: line.product_id,
                store_id: sale.store_id.clone(),
                movement_type: MovementType::Return,
                qty: line.qty,
                unit_cost: None,
                actor_id,
                reference: MovementReference { table: "sales", id: sale_id },
            };
            self.inventory.apply_movement_in_tx(&mut tx, movement).await?;
        }

        self.sales.mark_refunded_in_tx(&mut tx, sale_id).await?;
        tx.commit().await?;

        let refunded = Sale { status: SaleStatus::Refunded, ..sale };

        if let Ok(builder) = DomainEvent::builder("sale_refunded", sale_id, "sale", refunded.store_id.clone())
            .data(serde_json::json!({ "sale_id": sale_id }))
        {
            if let Err(err) = self.events.publish(&builder.build()).await {
                tracing::warn!(%err, "failed to publish sale_refunded event");
            }
        }

        Ok(refunded)
    }
}
