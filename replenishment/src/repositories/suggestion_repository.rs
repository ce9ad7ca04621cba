//! Suggestion persistence: list with filters, edit while PENDING, status transitions (spec §4.8).

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Suggestion, SuggestionEdit, SuggestionStatus};

#[derive(Debug, Clone, Default)]
pub struct SuggestionFilter {
    pub store_id: Option<String>,
    pub status: Option<SuggestionStatus>,
    pub product_id: Option<Uuid>,
}

#[async_trait]
pub trait SuggestionRepository: Send + Sync {
    async fn insert(&self, suggestion: &Suggestion) -> Result<()>;
    async fn list(&self, filter: &SuggestionFilter) -> Result<Vec<Suggestion>>;
    async fn by_id(&self, id: Uuid) -> Result<Option<Suggestion>>;
    async fn update_edit(&self, id: Uuid, edit: &SuggestionEdit) -> Result<Option<Suggestion>>;
    async fn set_status(&self, id: Uuid, status: SuggestionStatus) -> Result<()>;
    async fn delete_for_store(&self, store_id: &str) -> Result<u64>;

    async fn lock_pending_by_ids_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ids: &[Uuid],
    ) -> Result<Vec<Suggestion>>;
    async fn set_status_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        status: SuggestionStatus,
    ) -> Result<()>;
}

pub struct PgSuggestionRepository {
    pool: PgPool,
}

impl PgSuggestionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SUGGESTION_COLUMNS: &str = "id, product_id, store_id, supplier_id, status, rop, order_qty, \
     analysis_period_days, stock_duration_days, urgency, next_delivery_date, \
     scenarios, reason, note, created_at";

#[async_trait]
impl SuggestionRepository for PgSuggestionRepository {
    async fn insert(&self, s: &Suggestion) -> Result<()> {
        sqlx::query(
            "INSERT INTO suggestions \
                (id, product_id, store_id, supplier_id, status, rop, order_qty, \
                 analysis_period_days, stock_duration_days, urgency, next_delivery_date, \
                 scenarios, reason, note, created_at) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15)",
        )
        .bind(s.id)
        .bind(s.product_id)
        .bind(&s.store_id)
        .bind(s.supplier_id)
        .bind(s.status)
        .bind(s.rop)
        .bind(s.order_qty)
        .bind(s.analysis_period_days as i32)
        .bind(s.stock_duration_days)
        .bind(s.urgency)
        .bind(s.next_delivery_date)
        .bind(sqlx::types::Json(&s.scenarios))
        .bind(sqlx::types::Json(&s.reason))
        .bind(&s.note)
        .bind(s.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, filter: &SuggestionFilter) -> Result<Vec<Suggestion>> {
        let query = format!(
            "SELECT {cols} FROM suggestions \
             WHERE ($1::text IS NULL OR store_id = $1) \
               AND ($2::text IS NULL OR status = $2) \
               AND ($3::uuid IS NULL OR product_id = $3) \
             ORDER BY created_at DESC",
            cols = SUGGESTION_COLUMNS
        );
        let status_str = filter.status.map(|s| format!("{:?}", s).to_uppercase());
        let rows = sqlx::query_as::<_, SuggestionRow>(&query)
            .bind(&filter.store_id)
            .bind(status_str)
            .bind(filter.product_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Suggestion::from).collect())
    }

    async fn by_id(&self, id: Uuid) -> Result<Option<Suggestion>> {
        let row = sqlx::query_as::<_, SuggestionRow>(&format!(
            "SELECT {cols} FROM suggestions WHERE id = $1",
            cols = SUGGESTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Suggestion::from))
    }

    async fn update_edit(&self, id: Uuid, edit: &SuggestionEdit) -> Result<Option<Suggestion>> {
        sqlx::query(
            "UPDATE suggestions SET \
                order_qty = COALESCE($2, order_qty), \
                rop = COALESCE($3, rop), \
                note = COALESCE($4, note) \
             WHERE id = $1 AND status = 'PENDING'",
        )
        .bind(id)
        .bind(edit.order_qty)
        .bind(edit.rop)
        .bind(&edit.note)
        .execute(&self.pool)
        .await?;
        self.by_id(id).await
    }

    async fn set_status(&self, id: Uuid, status: SuggestionStatus) -> Result<()> {
        sqlx::query("UPDATE suggestions SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_for_store(&self, store_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM suggestions WHERE store_id = $1")
            .bind(store_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn lock_pending_by_ids_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        ids: &[Uuid],
    ) -> Result<Vec<Suggestion>> {
        let rows = sqlx::query_as::<_, SuggestionRow>(&format!(
            "SELECT {cols} FROM suggestions WHERE id = ANY($1) AND status = 'PENDING' FOR UPDATE",
            cols = SUGGESTION_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&mut **tx)
        .await?;
        Ok(rows.into_iter().map(Suggestion::from).collect())
    }

    async fn set_status_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        status: SuggestionStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE suggestions SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct SuggestionRow {
    id: Uuid,
    product_id: Uuid,
    store_id: String,
    supplier_id: Option<Uuid>,
    status: SuggestionStatus,
    rop: i64,
    order_qty: i64,
    analysis_period_days: i32,
    stock_duration_days: f64,
    urgency: crate::models::UrgencyLevel,
    next_delivery_date: Option<chrono::NaiveDate>,
    #[sqlx(json)]
    scenarios: Vec<crate::models::CoverageScenario>,
    #[sqlx(json)]
    reason: crate::models::SuggestionReason,
    note: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<SuggestionRow> for Suggestion {
    fn from(row: SuggestionRow) -> Self {
        Suggestion {
            id: row.id,
            product_id: row.product_id,
            store_id: row.store_id,
            supplier_id: row.supplier_id,
            status: row.status,
            rop: row.rop,
            order_qty: row.order_qty,
            analysis_period_days: row.analysis_period_days as u32,
            stock_duration_days: row.stock_duration_days,
            urgency: row.urgency,
            next_delivery_date: row.next_delivery_date,
            scenarios: row.scenarios,
            reason: row.reason,
            note: row.note,
            created_at: row.created_at,
        }
    }
}
