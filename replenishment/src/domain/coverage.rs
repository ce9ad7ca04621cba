//! Coverage Calculator: forecast + stock + horizon -> actionable quantities and dates (spec §4.5).

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::CoverageScenario;

pub const MAX_COVERAGE_DAYS: f64 = 365.0;

#[derive(Debug, Clone)]
pub struct Coverage {
    pub days_remaining: f64,
    pub stockout_date: Option<NaiveDate>,
}

pub fn current_coverage(current_stock: i64, mean_daily_demand: f64, today: NaiveDate) -> Coverage {
    let days_remaining = if mean_daily_demand > 0.0 {
        (current_stock as f64 / mean_daily_demand).min(MAX_COVERAGE_DAYS)
    } else {
        MAX_COVERAGE_DAYS
    };

    let stockout_date = if days_remaining < MAX_COVERAGE_DAYS {
        let whole_days = days_remaining.floor() as i64;
        today.checked_add_signed(chrono::Duration::days(whole_days))
    } else {
        None
    };

    Coverage { days_remaining, stockout_date }
}

/// target = ceil(meanDailyDemand * horizonDays + safetyStock); qty = max(0, target - currentStock);
/// rounded up to the nearest multiple of moq (default 1).
pub fn order_quantity(
    current_stock: i64,
    mean_daily_demand: f64,
    horizon_days: u32,
    safety_stock: i64,
    moq: i64,
) -> i64 {
    let target = (mean_daily_demand * horizon_days as f64 + safety_stock as f64).ceil() as i64;
    let raw = (target - current_stock).max(0);
    let moq = moq.max(1);
    if raw == 0 {
        0
    } else {
        ((raw + moq - 1) / moq) * moq
    }
}

pub fn scenarios(
    current_stock: i64,
    mean_daily_demand: f64,
    safety_stock: i64,
    unit_price: Decimal,
    moq: i64,
    periods: &[u32],
) -> Vec<CoverageScenario> {
    periods
        .iter()
        .map(|&coverage_days| {
            let qty = order_quantity(current_stock, mean_daily_demand, coverage_days, safety_stock, moq);
            let final_stock = current_stock + qty;
            let actual_coverage_days = if mean_daily_demand > 0.0 {
                (final_stock as f64 / mean_daily_demand).min(MAX_COVERAGE_DAYS)
            } else {
                MAX_COVERAGE_DAYS
            };
            let total_cost = unit_price * Decimal::from(qty);
            let cost_per_day = if actual_coverage_days > 0.0 {
                total_cost / Decimal::from_f64_retain(actual_coverage_days).unwrap_or(Decimal::ONE)
            } else {
                Decimal::ZERO
            };
            CoverageScenario {
                label: format!("{}d", coverage_days),
                coverage_days,
                order_quantity: qty,
                final_stock,
                actual_coverage_days,
                total_cost,
                cost_per_day,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_demand_gives_max_coverage() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let c = current_coverage(100, 0.0, today);
        assert_eq!(c.days_remaining, MAX_COVERAGE_DAYS);
        assert_eq!(c.stockout_date, None);
    }

    #[test]
    fn coverage_clamps_at_365_days() {
        let today = NaiveDate::from_ymd_opt(2026, 7, 28).unwrap();
        let c = current_coverage(100_000, 1.0, today);
        assert_eq!(c.days_remaining, MAX_COVERAGE_DAYS);
        assert_eq!(c.stockout_date, None);
    }

    #[test]
    fn order_quantity_rounds_up_to_moq() {
        // target = ceil(10*7 + 5) = 75, raw = 75 - 20 = 55, moq 10 -> 60
        let qty = order_quantity(20, 10.0, 7, 5, 10);
        assert_eq!(qty, 60);
    }

    #[test]
    fn order_quantity_is_zero_when_already_covered() {
        let qty = order_quantity(1000, 1.0, 7, 0, 1);
        assert_eq!(qty, 0);
    }

    #[test]
    fn scenarios_cover_requested_periods() {
        let results = scenarios(10, 5.0, 2, dec!(1.50), 1, &[1, 7, 30]);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].coverage_days, 1);
        assert_eq!(results[2].coverage_days, 30);
    }
}
