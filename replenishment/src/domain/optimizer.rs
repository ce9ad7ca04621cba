//! Supplier Optimizer: choose among suppliers for a SKU by cost, timing, and risk (spec §4.6).

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{RiskLevel, Supplier, SupplierOption};

use super::schedule;

pub struct Candidate<'a> {
    pub supplier: &'a Supplier,
    pub unit_price: Decimal,
}

fn classify_risk(days_until_delivery: i64, days_remaining: f64) -> RiskLevel {
    let d = days_until_delivery as f64;
    if d > days_remaining {
        RiskLevel::Critical
    } else if d > days_remaining - 1.0 {
        RiskLevel::High
    } else if d > days_remaining - 3.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[derive(Debug, Clone)]
pub struct OptimizerResult {
    pub options: Vec<SupplierOption>,
    pub savings_vs_max: Decimal,
    pub savings_percent: f64,
}

pub fn optimize(
    candidates: &[Candidate<'_>],
    order_quantity: i64,
    days_remaining: f64,
    now: NaiveDate,
) -> OptimizerResult {
    let mut options: Vec<SupplierOption> = candidates
        .iter()
        .map(|c| {
            let order_date = schedule::next_order_date(c.supplier, now);
            let delivery = schedule::delivery_date(c.supplier, order_date);
            let days_until_delivery = (delivery - now).num_days();
            let total_cost = c.unit_price * Decimal::from(order_quantity);
            let risk = classify_risk(days_until_delivery, days_remaining);
            SupplierOption {
                supplier_id: c.supplier.id,
                supplier_name: c.supplier.name.clone(),
                unit_price: c.unit_price,
                order_date,
                delivery_date: delivery,
                days_until_delivery,
                total_cost,
                risk,
                recommended: false,
            }
        })
        .collect();

    if options.is_empty() {
        return OptimizerResult { options, savings_vs_max: Decimal::ZERO, savings_percent: 0.0 };
    }

    let low_risk_exists = options.iter().any(|o| o.risk <= RiskLevel::Low);
    let recommended_idx = if low_risk_exists {
        let mut indices: Vec<usize> = (0..options.len())
            .filter(|&i| options[i].risk <= RiskLevel::Low)
            .collect();
        indices.sort_by(|&a, &b| {
            options[a]
                .total_cost
                .cmp(&options[b].total_cost)
                .then(options[a].delivery_date.cmp(&options[b].delivery_date))
                .then(options[a].supplier_id.cmp(&options[b].supplier_id))
        });
        indices[0]
    } else {
        let min_risk = options.iter().map(|o| o.risk).min().unwrap();
        let mut indices: Vec<usize> = (0..options.len())
            .filter(|&i| options[i].risk == min_risk)
            .collect();
        indices.sort_by(|&a, &b| {
            options[a]
                .delivery_date
                .cmp(&options[b].delivery_date)
                .then(options[a].total_cost.cmp(&options[b].total_cost))
        });
        indices[0]
    };

    options[recommended_idx].recommended = true;

    let recommended_cost = options[recommended_idx].total_cost;
    let max_cost = options.iter().map(|o| o.total_cost).max().unwrap_or(recommended_cost);
    let savings_vs_max = max_cost - recommended_cost;
    let savings_percent = if max_cost > Decimal::ZERO {
        (savings_vs_max / max_cost * Decimal::from(100)).to_f64().unwrap_or(0.0)
    } else {
        0.0
    };

    OptimizerResult { options, savings_vs_max, savings_percent }
}

#[allow(dead_code)]
fn recommended_supplier_id(result: &OptimizerResult) -> Option<Uuid> {
    result.options.iter().find(|o| o.recommended).map(|o| o.supplier_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeliverySchedule;
    use rust_decimal_macros::dec;

    fn supplier(name: &str, lead_time: i32) -> Supplier {
        Supplier {
            id: Uuid::new_v4(),
            name: name.into(),
            lead_time_days: lead_time,
            delivery_schedule: DeliverySchedule::Daily,
            minimum_order_quantity: 1,
            cutoff_time: None,
            active: true,
        }
    }

    #[test]
    fn cheapest_low_risk_candidate_is_recommended() {
        let s1 = supplier("Cheap", 1);
        let s2 = supplier("Expensive", 1);
        let candidates = vec![
            Candidate { supplier: &s1, unit_price: dec!(1.00) },
            Candidate { supplier: &s2, unit_price: dec!(5.00) },
        ];
        let now = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let result = optimize(&candidates, 10, 30.0, now);
        let recommended = result.options.iter().find(|o| o.recommended).unwrap();
        assert_eq!(recommended.supplier_name, "Cheap");
        assert!(result.savings_vs_max > Decimal::ZERO);
    }

    #[test]
    fn only_critical_risk_candidates_pick_earliest_delivery() {
        let slow = supplier("Slow", 20);
        let slower = supplier("Slower", 25);
        let candidates = vec![
            Candidate { supplier: &slow, unit_price: dec!(2.00) },
            Candidate { supplier: &slower, unit_price: dec!(1.00) },
        ];
        let now = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        // days_remaining small so every candidate is CRITICAL
        let result = optimize(&candidates, 10, 2.0, now);
        let recommended = result.options.iter().find(|o| o.recommended).unwrap();
        assert_eq!(recommended.supplier_name, "Slow");
    }
}
