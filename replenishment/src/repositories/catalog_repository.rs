//! Read-only access to products, suppliers, and the product-supplier price link.
//! Catalog CRUD itself (categories, tax rules, pricing) is out of scope (spec §1).

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Product, Supplier};

#[derive(Debug, Clone)]
pub struct SupplierPrice {
    pub supplier: Supplier,
    pub unit_cost: Decimal,
    pub moq: i32,
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn active_products(&self, store_id: &str) -> Result<Vec<Product>>;
    async fn product_by_id(&self, product_id: Uuid) -> Result<Option<Product>>;
    async fn suppliers_for_product(&self, product_id: Uuid) -> Result<Vec<SupplierPrice>>;
}

pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn active_products(&self, store_id: &str) -> Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT DISTINCT p.id, p.sku, p.name, p.unit, p.status \
             FROM products p \
             JOIN batches b ON b.product_id = p.id \
             WHERE p.status = 'ACTIVE' AND b.store_id = $1 \
             ORDER BY p.sku",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn product_by_id(&self, product_id: Uuid) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, sku, name, unit, status FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn suppliers_for_product(&self, product_id: Uuid) -> Result<Vec<SupplierPrice>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            id: Uuid,
            name: String,
            lead_time_days: i32,
            #[sqlx(json)]
            delivery_schedule: crate::models::DeliverySchedule,
            minimum_order_quantity: i32,
            cutoff_time: Option<chrono::NaiveTime>,
            active: bool,
            unit_cost: Decimal,
            moq_override: Option<i32>,
        }

        let rows = sqlx::query_as::<_, Row>(
            "SELECT s.id, s.name, s.lead_time_days, s.delivery_schedule, \
                    s.minimum_order_quantity, s.cutoff_time, s.active, \
                    ps.unit_cost, ps.moq_override \
             FROM product_suppliers ps \
             JOIN suppliers s ON s.id = ps.supplier_id \
             WHERE ps.product_id = $1 AND s.active = true",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let moq = row.moq_override.unwrap_or(row.minimum_order_quantity).max(1);
                SupplierPrice {
                    supplier: Supplier {
                        id: row.id,
                        name: row.name,
                        lead_time_days: row.lead_time_days,
                        delivery_schedule: row.delivery_schedule,
                        minimum_order_quantity: row.minimum_order_quantity,
                        cutoff_time: row.cutoff_time,
                        active: row.active,
                    },
                    unit_cost: row.unit_cost,
                    moq,
                }
            })
            .collect())
    }
}
