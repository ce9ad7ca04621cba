//! Sales persistence and per-SKU daily demand history (spec §4.2, §4.10).

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Sale, SaleLine};

#[async_trait]
pub trait SalesRepository: Send + Sync {
    /// Daily quantity per product over `[today - windowDays + 1, today]`, zero-filled,
    /// excluding REFUNDED/VOIDED sales (spec §4.2). Index 0 is the oldest day.
    async fn history(
        &self,
        store_id: &str,
        product_ids: &[Uuid],
        window_days: u32,
        today: NaiveDate,
    ) -> Result<HashMap<Uuid, Vec<f64>>>;

    async fn insert_sale_in_tx(&self, tx: &mut Transaction<'_, Postgres>, sale: &Sale) -> Result<()>;
    async fn insert_sale_line_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        line: &SaleLine,
    ) -> Result<()>;

    async fn sale_by_id(&self, sale_id: Uuid) -> Result<Option<Sale>>;
    async fn sale_lines(&self, sale_id: Uuid) -> Result<Vec<SaleLine>>;
    async fn sale_by_id_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale_id: Uuid,
    ) -> Result<Option<Sale>>;
    async fn mark_refunded_in_tx(&self, tx: &mut Transaction<'_, Postgres>, sale_id: Uuid) -> Result<()>;
}

pub struct PgSalesRepository {
    pool: PgPool,
}

impl PgSalesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SalesRepository for PgSalesRepository {
    async fn history(
        &self,
        store_id: &str,
        product_ids: &[Uuid],
        window_days: u32,
        today: NaiveDate,
    ) -> Result<HashMap<Uuid, Vec<f64>>> {
        let window_start = today - chrono::Duration::days(window_days as i64 - 1);

        let rows: Vec<(Uuid, NaiveDate, i64)> = sqlx::query_as(
            "SELECT sl.product_id, (s.created_at AT TIME ZONE 'UTC')::date AS sale_day, \
                    SUM(sl.qty)::bigint AS qty \
             FROM sale_lines sl \
             JOIN sales s ON s.id = sl.sale_id \
             WHERE s.store_id = $1 AND sl.product_id = ANY($2) \
               AND s.status = 'COMPLETED' \
               AND (s.created_at AT TIME ZONE 'UTC')::date BETWEEN $3 AND $4 \
             GROUP BY sl.product_id, sale_day",
        )
        .bind(store_id)
        .bind(product_ids)
        .bind(window_start)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        let mut series: HashMap<Uuid, Vec<f64>> = product_ids
            .iter()
            .map(|&id| (id, vec![0.0; window_days as usize]))
            .collect();

        for (product_id, day, qty) in rows {
            let offset = (day - window_start).num_days();
            if offset >= 0 && (offset as usize) < window_days as usize {
                if let Some(bucket) = series.get_mut(&product_id) {
                    bucket[offset as usize] = qty as f64;
                }
            }
        }

        Ok(series)
    }

    async fn insert_sale_in_tx(&self, tx: &mut Transaction<'_, Postgres>, sale: &Sale) -> Result<()> {
        sqlx::query(
            "INSERT INTO sales \
                (id, sale_number, store_id, cashier_id, subtotal, tax_total, discount_total, \
                 total, paid, change, payment_method, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(sale.id)
        .bind(&sale.sale_number)
        .bind(&sale.store_id)
        .bind(sale.cashier_id)
        .bind(sale.subtotal)
        .bind(sale.tax_total)
        .bind(sale.discount_total)
        .bind(sale.total)
        .bind(sale.paid)
        .bind(sale.change)
        .bind(&sale.payment_method)
        .bind(sale.status)
        .bind(sale.created_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn insert_sale_line_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        line: &SaleLine,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO sale_lines \
                (id, sale_id, product_id, batch_id, qty, unit_price, tax_rate, discount, line_total) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(line.id)
        .bind(line.sale_id)
        .bind(line.product_id)
        .bind(line.batch_id)
        .bind(line.qty)
        .bind(line.unit_price)
        .bind(line.tax_rate)
        .bind(line.discount)
        .bind(line.line_total)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn sale_by_id(&self, sale_id: Uuid) -> Result<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            "SELECT id, sale_number, store_id, cashier_id, subtotal, tax_total, discount_total, \
                    total, paid, change, payment_method, status, created_at \
             FROM sales WHERE id = $1",
        )
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(sale)
    }

    async fn sale_lines(&self, sale_id: Uuid) -> Result<Vec<SaleLine>> {
        let lines = sqlx::query_as::<_, SaleLine>(
            "SELECT id, sale_id, product_id, batch_id, qty, unit_price, tax_rate, discount, \
                    line_total \
             FROM sale_lines WHERE sale_id = $1",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }

    async fn sale_by_id_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sale_id: Uuid,
    ) -> Result<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            "SELECT id, sale_number, store_id, cashier_id, subtotal, tax_total, discount_total, \
                    total, paid, change, payment_method, status, created_at \
             FROM sales WHERE id = $1 FOR UPDATE",
        )
        .bind(sale_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(sale)
    }

    async fn mark_refunded_in_tx(&self, tx: &mut Transaction<'_, Postgres>, sale_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE sales SET status = 'REFUNDED' WHERE id = $1")
            .bind(sale_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
