//! Purchase order persistence and the monotonic PO/GRN number counters (spec §4.9, §4.11).

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{NewPurchaseOrder, POLine, PurchaseOrder};

#[async_trait]
pub trait PurchaseOrderRepository: Send + Sync {
    /// Allocates the next PO number for a store from a locked counter row, creating the
    /// counter row on first use. One SQL round trip per call, called inside the caller's tx.
    async fn next_po_number_in_tx(&self, tx: &mut Transaction<'_, Postgres>, store_id: &str) -> Result<String>;
    async fn next_grn_number_in_tx(&self, tx: &mut Transaction<'_, Postgres>, store_id: &str) -> Result<String>;

    async fn create_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        po_number: String,
        new_po: &NewPurchaseOrder,
    ) -> Result<(PurchaseOrder, Vec<POLine>)>;

    async fn by_id(&self, id: Uuid) -> Result<Option<PurchaseOrder>>;
    async fn lines(&self, po_id: Uuid) -> Result<Vec<POLine>>;
}

pub struct PgPurchaseOrderRepository {
    pool: PgPool,
}

impl PgPurchaseOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn next_counter_value(
        tx: &mut Transaction<'_, Postgres>,
        counter_name: &str,
        store_id: &str,
    ) -> Result<i64> {
        sqlx::query(
            "INSERT INTO document_counters (counter_name, store_id, next_value) \
             VALUES ($1, $2, 1) \
             ON CONFLICT (counter_name, store_id) DO NOTHING",
        )
        .bind(counter_name)
        .bind(store_id)
        .execute(&mut **tx)
        .await?;

        let (value,): (i64,) = sqlx::query_as(
            "UPDATE document_counters SET next_value = next_value + 1 \
             WHERE counter_name = $1 AND store_id = $2 \
             RETURNING next_value - 1",
        )
        .bind(counter_name)
        .bind(store_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(value)
    }
}

#[async_trait]
impl PurchaseOrderRepository for PgPurchaseOrderRepository {
    async fn next_po_number_in_tx(&self, tx: &mut Transaction<'_, Postgres>, store_id: &str) -> Result<String> {
        let seq = Self::next_counter_value(tx, "po", store_id).await?;
        Ok(format!("PO-{}-{:06}", store_id, seq))
    }

    async fn next_grn_number_in_tx(&self, tx: &mut Transaction<'_, Postgres>, store_id: &str) -> Result<String> {
        let seq = Self::next_counter_value(tx, "grn", store_id).await?;
        Ok(format!("GRN-{}-{:06}", store_id, seq))
    }

    async fn create_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        po_number: String,
        new_po: &NewPurchaseOrder,
    ) -> Result<(PurchaseOrder, Vec<POLine>)> {
        let subtotal: Decimal = new_po
            .lines
            .iter()
            .map(|l| l.unit_cost * Decimal::from(l.qty_ordered))
            .sum();

        let po = sqlx::query_as::<_, PurchaseOrder>(
            "INSERT INTO purchase_orders \
                (id, po_number, store_id, supplier_id, status, subtotal, total, \
                 expected_delivery_date, created_by, created_at) \
             VALUES ($1,$2,$3,$4,'DRAFT',$5,$5,$6,$7,now()) \
             RETURNING id, po_number, store_id, supplier_id, status, subtotal, total, \
                       expected_delivery_date, created_by, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&po_number)
        .bind(&new_po.store_id)
        .bind(new_po.supplier_id)
        .bind(subtotal)
        .bind(new_po.expected_delivery_date)
        .bind(new_po.created_by)
        .fetch_one(&mut **tx)
        .await?;

        let mut lines = Vec::with_capacity(new_po.lines.len());
        for line in &new_po.lines {
            let line_total = line.unit_cost * Decimal::from(line.qty_ordered);
            let stored = sqlx::query_as::<_, POLine>(
                "INSERT INTO po_lines \
                    (id, purchase_order_id, product_id, suggestion_id, qty_ordered, \
                     qty_received, unit_cost, line_total) \
                 VALUES ($1,$2,$3,$4,$5,0,$6,$7) \
                 RETURNING id, purchase_order_id, product_id, suggestion_id, qty_ordered, \
                           qty_received, unit_cost, line_total",
            )
            .bind(Uuid::new_v4())
            .bind(po.id)
            .bind(line.product_id)
            .bind(line.suggestion_id)
            .bind(line.qty_ordered)
            .bind(line.unit_cost)
            .bind(line_total)
            .fetch_one(&mut **tx)
            .await?;
            lines.push(stored);
        }

        Ok((po, lines))
    }

    async fn by_id(&self, id: Uuid) -> Result<Option<PurchaseOrder>> {
        let po = sqlx::query_as::<_, PurchaseOrder>(
            "SELECT id, po_number, store_id, supplier_id, status, subtotal, total, \
                    expected_delivery_date, created_by, created_at \
             FROM purchase_orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(po)
    }

    async fn lines(&self, po_id: Uuid) -> Result<Vec<POLine>> {
        let lines = sqlx::query_as::<_, POLine>(
            "SELECT id, purchase_order_id, product_id, suggestion_id, qty_ordered, \
                    qty_received, unit_cost, line_total \
             FROM po_lines WHERE purchase_order_id = $1",
        )
        .bind(po_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }
}
