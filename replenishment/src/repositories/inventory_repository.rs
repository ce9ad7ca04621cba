//! Batch state and stock-movement persistence (spec §4.1).

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Batch, NewMovement, StockMovement};

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn current_stock(&self, product_id: Uuid, store_id: &str) -> Result<i64>;

    /// Ordered by (expiry asc nulls last, received_at asc, id asc) — spec §4.1 FEFO order.
    async fn batches_by_fefo(&self, product_id: Uuid, store_id: &str) -> Result<Vec<Batch>>;

    async fn batch_by_id_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        batch_id: Uuid,
    ) -> Result<Option<Batch>>;

    async fn apply_movement_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        movement: NewMovement,
    ) -> Result<(Batch, StockMovement)>;

    async fn find_or_create_batch_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        store_id: &str,
        supplier_id: Option<Uuid>,
        batch_number: &str,
        expiry_date: Option<chrono::NaiveDate>,
        unit_cost: rust_decimal::Decimal,
    ) -> Result<Batch>;
}

pub struct PgInventoryRepository {
    pool: PgPool,
}

impl PgInventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryRepository for PgInventoryRepository {
    async fn current_stock(&self, product_id: Uuid, store_id: &str) -> Result<i64> {
        let row: (Option<i64>,) = sqlx::query_as(
            "SELECT COALESCE(SUM(qty_on_hand), 0) FROM batches \
             WHERE product_id = $1 AND store_id = $2 AND qty_on_hand > 0",
        )
        .bind(product_id)
        .bind(store_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0.unwrap_or(0))
    }

    async fn batches_by_fefo(&self, product_id: Uuid, store_id: &str) -> Result<Vec<Batch>> {
        let batches = sqlx::query_as::<_, Batch>(
            "SELECT id, product_id, store_id, supplier_id, batch_number, expiry_date, \
                    unit_cost, qty_on_hand, received_at \
             FROM batches \
             WHERE product_id = $1 AND store_id = $2 AND qty_on_hand > 0 \
             ORDER BY expiry_date ASC NULLS LAST, received_at ASC, id ASC",
        )
        .bind(product_id)
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(batches)
    }

    async fn batch_by_id_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        batch_id: Uuid,
    ) -> Result<Option<Batch>> {
        let batch = sqlx::query_as::<_, Batch>(
            "SELECT id, product_id, store_id, supplier_id, batch_number, expiry_date, \
                    unit_cost, qty_on_hand, received_at \
             FROM batches WHERE id = $1 FOR UPDATE",
        )
        .bind(batch_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(batch)
    }

    async fn apply_movement_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        movement: NewMovement,
    ) -> Result<(Batch, StockMovement)> {
        let batch = self
            .batch_by_id_for_update(tx, movement.batch_id)
            .await?
            .ok_or(Error::BatchNotFound { batch_id: movement.batch_id })?;

        if batch.store_id != movement.store_id {
            return Err(Error::StoreMismatch { batch_id: movement.batch_id });
        }

        let new_qty = batch.qty_on_hand + movement.qty;
        if new_qty < 0 {
            return Err(Error::InsufficientStock {
                product_id: movement.product_id,
                requested: -movement.qty,
                available: batch.qty_on_hand,
            });
        }

        sqlx::query("UPDATE batches SET qty_on_hand = $1 WHERE id = $2")
            .bind(new_qty)
            .bind(batch.id)
            .execute(&mut **tx)
            .await?;

        let stored = sqlx::query_as::<_, StockMovement>(
            "INSERT INTO stock_movements \
                (id, product_id, batch_id, store_id, movement_type, qty, unit_cost, actor_id, \
                 reference_table, reference_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now()) \
             RETURNING id, product_id, batch_id, store_id, movement_type, qty, unit_cost, \
                       actor_id, reference_table, reference_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(movement.product_id)
        .bind(movement.batch_id)
        .bind(&movement.store_id)
        .bind(movement.movement_type)
        .bind(movement.qty)
        .bind(movement.unit_cost)
        .bind(movement.actor_id)
        .bind(movement.reference.table)
        .bind(movement.reference.id)
        .fetch_one(&mut **tx)
        .await?;

        let updated = Batch { qty_on_hand: new_qty, ..batch };
        Ok((updated, stored))
    }

    async fn find_or_create_batch_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        store_id: &str,
        supplier_id: Option<Uuid>,
        batch_number: &str,
        expiry_date: Option<chrono::NaiveDate>,
        unit_cost: rust_decimal::Decimal,
    ) -> Result<Batch> {
        let existing = sqlx::query_as::<_, Batch>(
            "SELECT id, product_id, store_id, supplier_id, batch_number, expiry_date, \
                    unit_cost, qty_on_hand, received_at \
             FROM batches WHERE product_id = $1 AND store_id = $2 AND batch_number = $3 \
             FOR UPDATE",
        )
        .bind(product_id)
        .bind(store_id)
        .bind(batch_number)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(batch) = existing {
            return Ok(batch);
        }

        let created = sqlx::query_as::<_, Batch>(
            "INSERT INTO batches \
                (id, product_id, store_id, supplier_id, batch_number, expiry_date, unit_cost, \
                 qty_on_hand, received_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 0, now()) \
             RETURNING id, product_id, store_id, supplier_id, batch_number, expiry_date, \
                       unit_cost, qty_on_hand, received_at",
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(store_id)
        .bind(supplier_id)
        .bind(batch_number)
        .bind(expiry_date)
        .bind(unit_cost)
        .fetch_one(&mut **tx)
        .await?;

        Ok(created)
    }
}
