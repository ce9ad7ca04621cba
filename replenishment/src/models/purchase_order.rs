use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum POStatus {
    Draft,
    Approved,
    Sent,
    Partial,
    Received,
    Cancelled,
}

impl POStatus {
    pub fn can_transition_to(self, next: POStatus) -> bool {
        use POStatus::*;
        matches!(
            (self, next),
            (Draft, Approved)
                | (Draft, Cancelled)
                | (Approved, Sent)
                | (Approved, Cancelled)
                | (Sent, Partial)
                | (Sent, Received)
                | (Sent, Cancelled)
                | (Partial, Received)
                | (Partial, Cancelled)
        )
    }

    pub fn transition_to(self, next: POStatus) -> Result<POStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::Validation(format!(
                "illegal purchase order transition {:?} -> {:?}",
                self, next
            )))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub po_number: String,
    pub store_id: String,
    pub supplier_id: Uuid,
    pub status: POStatus,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub expected_delivery_date: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct POLine {
    pub id: Uuid,
    pub purchase_order_id: Uuid,
    pub product_id: Uuid,
    pub suggestion_id: Option<Uuid>,
    pub qty_ordered: i64,
    pub qty_received: i64,
    pub unit_cost: Decimal,
    pub line_total: Decimal,
}

impl POLine {
    pub fn is_fully_received(&self) -> bool {
        self.qty_received >= self.qty_ordered
    }

    pub fn qty_outstanding(&self) -> i64 {
        (self.qty_ordered - self.qty_received).max(0)
    }
}

/// One approved suggestion being grouped into a supplier's draft PO (spec §4.9).
#[derive(Debug, Clone)]
pub struct NewPOLine {
    pub suggestion_id: Uuid,
    pub product_id: Uuid,
    pub qty_ordered: i64,
    pub unit_cost: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewPurchaseOrder {
    pub store_id: String,
    pub supplier_id: Uuid,
    pub expected_delivery_date: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
    pub lines: Vec<NewPOLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_cannot_skip_to_received() {
        assert!(!POStatus::Draft.can_transition_to(POStatus::Received));
        assert!(POStatus::Draft.transition_to(POStatus::Approved).is_ok());
    }

    #[test]
    fn partial_receipt_can_complete_or_cancel() {
        assert!(POStatus::Partial.can_transition_to(POStatus::Received));
        assert!(POStatus::Partial.can_transition_to(POStatus::Cancelled));
        assert!(!POStatus::Received.can_transition_to(POStatus::Cancelled));
    }

    #[test]
    fn outstanding_qty_clamps_at_zero_on_overreceipt() {
        let line = POLine {
            id: Uuid::new_v4(),
            purchase_order_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            suggestion_id: None,
            qty_ordered: 10,
            qty_received: 12,
            unit_cost: Decimal::new(100, 2),
            line_total: Decimal::new(1000, 2),
        };
        assert!(line.is_fully_received());
        assert_eq!(line.qty_outstanding(), 0);
    }
}
