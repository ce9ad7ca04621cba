use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SuggestionStatus {
    Pending,
    Approved,
    Ordered,
    Rejected,
}

impl SuggestionStatus {
    /// Single function enforcing legal edges (spec §9: explicit enum + transition table,
    /// no scattered `if` chains). ORDERED and REJECTED are terminal.
    pub fn can_transition_to(self, next: SuggestionStatus) -> bool {
        use SuggestionStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Pending, Ordered) | (Approved, Ordered)
        )
    }

    pub fn transition_to(self, next: SuggestionStatus) -> Result<SuggestionStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(Error::Validation(format!(
                "illegal suggestion transition {:?} -> {:?}",
                self, next
            )))
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SuggestionStatus::Ordered | SuggestionStatus::Rejected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UrgencyLevel {
    Critical,
    Urgent,
    Low,
    Good,
    Overstocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionCode {
    OrderToday,
    OrderSoon,
    Monitor,
    ReduceOrders,
}

impl UrgencyLevel {
    /// Thresholds on daysRemaining from spec §4.7.
    pub fn from_days_remaining(days_remaining: f64) -> Self {
        if days_remaining < 1.0 {
            UrgencyLevel::Critical
        } else if days_remaining < 3.0 {
            UrgencyLevel::Urgent
        } else if days_remaining < 7.0 {
            UrgencyLevel::Low
        } else if days_remaining <= 30.0 {
            UrgencyLevel::Good
        } else {
            UrgencyLevel::Overstocked
        }
    }

    pub fn action(self) -> ActionCode {
        match self {
            UrgencyLevel::Critical | UrgencyLevel::Urgent => ActionCode::OrderToday,
            UrgencyLevel::Low => ActionCode::OrderSoon,
            UrgencyLevel::Good => ActionCode::Monitor,
            UrgencyLevel::Overstocked => ActionCode::ReduceOrders,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DemandPattern {
    Steady,
    Growing,
    Declining,
    Seasonal,
    Erratic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendDirection {
    Growing,
    Declining,
    Steady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub direction: TrendDirection,
    pub slope: f64,
    pub r2: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageScenario {
    pub label: String,
    pub coverage_days: u32,
    pub order_quantity: i64,
    pub final_stock: i64,
    pub actual_coverage_days: f64,
    pub total_cost: Decimal,
    pub cost_per_day: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierOption {
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub unit_price: Decimal,
    pub order_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub days_until_delivery: i64,
    pub total_cost: Decimal,
    pub risk: RiskLevel,
    pub recommended: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionReason {
    pub pattern: DemandPattern,
    pub confidence: f64,
    pub trend: Trend,
    pub forecasted_daily_demand: f64,
    pub urgency: UrgencyLevel,
    pub action: ActionCode,
    pub message: String,
    pub supplier_options: Vec<SupplierOption>,
    pub savings_vs_max: Decimal,
    pub savings_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: Uuid,
    pub product_id: Uuid,
    pub store_id: String,
    pub supplier_id: Option<Uuid>,
    pub status: SuggestionStatus,
    pub rop: i64,
    pub order_qty: i64,
    pub analysis_period_days: u32,
    pub stock_duration_days: f64,
    pub urgency: UrgencyLevel,
    pub next_delivery_date: Option<NaiveDate>,
    pub scenarios: Vec<CoverageScenario>,
    pub reason: SuggestionReason,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Edits allowed only while PENDING (spec §4.8).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionEdit {
    pub order_qty: Option<i64>,
    pub rop: Option<i64>,
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgency_thresholds_match_spec() {
        assert_eq!(UrgencyLevel::from_days_remaining(0.5), UrgencyLevel::Critical);
        assert_eq!(UrgencyLevel::from_days_remaining(2.5), UrgencyLevel::Urgent);
        assert_eq!(UrgencyLevel::from_days_remaining(6.9), UrgencyLevel::Low);
        assert_eq!(UrgencyLevel::from_days_remaining(7.0), UrgencyLevel::Good);
        assert_eq!(UrgencyLevel::from_days_remaining(30.0), UrgencyLevel::Good);
        assert_eq!(UrgencyLevel::from_days_remaining(30.1), UrgencyLevel::Overstocked);
    }

    #[test]
    fn status_machine_has_no_back_edges() {
        assert!(SuggestionStatus::Pending.can_transition_to(SuggestionStatus::Approved));
        assert!(SuggestionStatus::Approved.can_transition_to(SuggestionStatus::Ordered));
        assert!(!SuggestionStatus::Ordered.can_transition_to(SuggestionStatus::Pending));
        assert!(!SuggestionStatus::Rejected.can_transition_to(SuggestionStatus::Approved));
        assert!(SuggestionStatus::Ordered.is_terminal());
        assert!(SuggestionStatus::Rejected.is_terminal());
    }

    #[test]
    fn pending_to_ordered_directly_is_legal() {
        assert!(SuggestionStatus::Pending
            .transition_to(SuggestionStatus::Ordered)
            .is_ok());
    }
}
