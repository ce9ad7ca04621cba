use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Batch {
    pub id: Uuid,
    pub product_id: Uuid,
    pub store_id: String,
    pub supplier_id: Option<Uuid>,
    pub batch_number: String,
    pub expiry_date: Option<NaiveDate>,
    pub unit_cost: Decimal,
    pub qty_on_hand: i64,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    Receive,
    Sale,
    Return,
    Adjustment,
    Transfer,
    Waste,
}

impl MovementType {
    /// Sign convention from spec §3: RECEIVE/RETURN positive, SALE/WASTE/TRANSFER-out negative,
    /// ADJUSTMENT carries whatever sign the caller supplies.
    pub fn default_sign(self) -> Option<i64> {
        match self {
            MovementType::Receive | MovementType::Return => Some(1),
            MovementType::Sale | MovementType::Waste | MovementType::Transfer => Some(-1),
            MovementType::Adjustment => None,
        }
    }
}

/// (table, id) audit trail — each write path stamps its own origin so a movement can be
/// traced back to the sale, GRN, or adjustment that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementReference {
    pub table: &'static str,
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub batch_id: Uuid,
    pub store_id: String,
    pub movement_type: MovementType,
    pub qty: i64,
    pub unit_cost: Option<Decimal>,
    pub actor_id: Option<Uuid>,
    pub reference_table: String,
    pub reference_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    pub fn reference(&self) -> MovementReference {
        MovementReference {
            table: match self.reference_table.as_str() {
                "sales" => "sales",
                "grn" => "grn",
                "purchase_orders" => "purchase_orders",
                _ => "adjustments",
            },
            id: self.reference_id,
        }
    }
}

/// A pending write: `applyMovement` turns this into a persisted `StockMovement` plus the
/// resulting batch state (spec §4.1).
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub batch_id: Uuid,
    pub product_id: Uuid,
    pub store_id: String,
    pub movement_type: MovementType,
    pub qty: i64,
    pub unit_cost: Option<Decimal>,
    pub actor_id: Option<Uuid>,
    pub reference: MovementReference,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receive_and_return_are_positive() {
        assert_eq!(MovementType::Receive.default_sign(), Some(1));
        assert_eq!(MovementType::Return.default_sign(), Some(1));
    }

    #[test]
    fn sale_waste_transfer_are_negative() {
        assert_eq!(MovementType::Sale.default_sign(), Some(-1));
        assert_eq!(MovementType::Waste.default_sign(), Some(-1));
        assert_eq!(MovementType::Transfer.default_sign(), Some(-1));
    }

    #[test]
    fn adjustment_has_no_fixed_sign() {
        assert_eq!(MovementType::Adjustment.default_sign(), None);
    }
}
