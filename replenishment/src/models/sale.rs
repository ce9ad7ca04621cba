use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SaleStatus {
    Completed,
    Refunded,
    Voided,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub sale_number: String,
    pub store_id: String,
    pub cashier_id: Uuid,
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub discount_total: Decimal,
    pub total: Decimal,
    pub paid: Decimal,
    pub change: Decimal,
    pub payment_method: String,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    /// First batch consumed for this line, kept for receipt traceability (spec §4.10).
    pub batch_id: Uuid,
    pub qty: i64,
    pub unit_price: Decimal,
    pub tax_rate: Decimal,
    pub discount: Decimal,
    pub line_total: Decimal,
}

impl SaleLine {
    pub fn line_total(&self) -> Decimal {
        let gross = self.unit_price * Decimal::from(self.qty);
        let tax = gross * self.tax_rate;
        let discount = gross * self.discount;
        gross + tax - discount
    }
}

/// A line as requested by the POS before batches are allocated.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSaleLine {
    pub product_id: Uuid,
    pub qty: i64,
    pub unit_price: Decimal,
    pub tax_rate: Decimal,
    pub discount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub store_id: String,
    pub cashier_id: Uuid,
    pub payment_method: String,
    pub paid: Decimal,
    pub lines: Vec<NewSaleLine>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn line_total_applies_tax_then_discount() {
        let line = SaleLine {
            id: Uuid::new_v4(),
            sale_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            batch_id: Uuid::new_v4(),
            qty: 2,
            unit_price: dec!(10.00),
            tax_rate: dec!(0.15),
            discount: dec!(0.10),
            line_total: Decimal::ZERO,
        };
        // gross = 20.00, tax = 3.00, discount = 2.00 => 21.00
        assert_eq!(line.line_total(), dec!(21.00));
    }
}
