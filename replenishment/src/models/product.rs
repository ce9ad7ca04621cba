use chrono::Weekday;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductStatus {
    Active,
    Discontinued,
    OutOfStock,
}

/// The RDE only reads products; catalog CRUD (categories, tax, pricing rules) is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub unit: String,
    pub status: ProductStatus,
}

impl Product {
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

/// Delivery-schedule tagged variant (spec §9: no inheritance, a single pure dispatch function).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliverySchedule {
    Daily,
    SpecificDays { days: BTreeSet<Weekday> },
    Weekly { day: Weekday },
    /// `parity` selects which ISO week parity (`week_of_year % 2`) the supplier delivers on.
    BiWeekly { day: Weekday, parity: u8 },
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub lead_time_days: i32,
    #[sqlx(json)]
    pub delivery_schedule: DeliverySchedule,
    pub minimum_order_quantity: i32,
    pub cutoff_time: Option<chrono::NaiveTime>,
    pub active: bool,
}

impl Supplier {
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Many-to-many product/supplier link; `moq_override` takes precedence over the
/// supplier's blanket `minimum_order_quantity` when present (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductSupplier {
    pub product_id: Uuid,
    pub supplier_id: Uuid,
    pub unit_cost: Decimal,
    pub moq_override: Option<i32>,
}

impl ProductSupplier {
    pub fn effective_moq(&self, supplier_moq: i32) -> i32 {
        self.moq_override.unwrap_or(supplier_moq).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moq_override_wins_over_supplier_default() {
        let link = ProductSupplier {
            product_id: Uuid::new_v4(),
            supplier_id: Uuid::new_v4(),
            unit_cost: Decimal::new(150, 2),
            moq_override: Some(24),
        };
        assert_eq!(link.effective_moq(10), 24);
    }

    #[test]
    fn falls_back_to_supplier_moq_when_absent() {
        let link = ProductSupplier {
            product_id: Uuid::new_v4(),
            supplier_id: Uuid::new_v4(),
            unit_cost: Decimal::new(150, 2),
            moq_override: None,
        };
        assert_eq!(link.effective_moq(10), 10);
    }
}
