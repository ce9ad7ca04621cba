//! Forecast Engine: demand pattern classification and point forecasting (spec §4.4). No I/O.

use crate::models::{DemandPattern, Trend, TrendDirection};

#[derive(Debug, Clone)]
pub struct Forecast {
    pub pattern: DemandPattern,
    pub pattern_confidence: f64,
    pub trend: Trend,
    pub mean_daily_demand: f64,
    pub stddev: f64,
    pub safety_stock: i64,
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap());
    v
}

/// Linear-interpolated percentile over a pre-sorted slice.
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }
    if sorted_values.len() == 1 {
        return sorted_values[0];
    }
    let rank = p * (sorted_values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted_values[lo]
    } else {
        let frac = rank - lo as f64;
        sorted_values[lo] + (sorted_values[hi] - sorted_values[lo]) * frac
    }
}

fn median(values: &[f64]) -> f64 {
    percentile(&sorted(values), 0.5)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn variance(values: &[f64]) -> f64 {
    let s = stddev(values);
    s * s
}

/// Replace values outside [Q1 - 1.5*IQR, Q3 + 1.5*IQR] with the series median.
/// Skipped when fewer than 7 non-zero points exist (spec §4.4 step 1).
fn filter_outliers(series: &[f64]) -> Vec<f64> {
    let non_zero = series.iter().filter(|v| **v != 0.0).count();
    if non_zero < 7 {
        return series.to_vec();
    }
    let s = sorted(series);
    let q1 = percentile(&s, 0.25);
    let q3 = percentile(&s, 0.75);
    let iqr = q3 - q1;
    let lo = q1 - 1.5 * iqr;
    let hi = q3 + 1.5 * iqr;
    let med = median(series);
    series
        .iter()
        .map(|&v| if v < lo || v > hi { med } else { v })
        .collect()
}

/// Ordinary least squares of index -> quantity. Returns (slope, r2).
fn ols_trend(series: &[f64]) -> (f64, f64) {
    let n = series.len() as f64;
    if series.len() < 2 {
        return (0.0, 0.0);
    }
    let xs: Vec<f64> = (0..series.len()).map(|i| i as f64).collect();
    let x_mean = mean(&xs);
    let y_mean = mean(series);
    let mut cov = 0.0;
    let mut x_var = 0.0;
    for (x, y) in xs.iter().zip(series.iter()) {
        cov += (x - x_mean) * (y - y_mean);
        x_var += (x - x_mean).powi(2);
    }
    if x_var == 0.0 {
        return (0.0, 0.0);
    }
    let slope = cov / x_var;
    let intercept = y_mean - slope * x_mean;
    let ss_tot: f64 = series.iter().map(|y| (y - y_mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return (slope, 0.0);
    }
    let ss_res: f64 = xs
        .iter()
        .zip(series.iter())
        .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
        .sum();
    let r2 = (1.0 - ss_res / ss_tot).clamp(0.0, 1.0);
    let _ = n;
    (slope, r2)
}

/// Weekly seasonal strength: variance of weekday-averages over variance of the full series.
/// `anchor_weekday` is the ISO weekday (0=Mon..6=Sun) of series[0], so day i maps to
/// weekday (anchor_weekday + i) % 7.
fn seasonal_strength(series: &[f64], anchor_weekday: usize) -> (f64, [f64; 7]) {
    let mut buckets: [Vec<f64>; 7] = Default::default();
    for (i, &v) in series.iter().enumerate() {
        let weekday = (anchor_weekday + i) % 7;
        buckets[weekday].push(v);
    }
    let mut weekday_means = [0.0; 7];
    for (i, bucket) in buckets.iter().enumerate() {
        weekday_means[i] = mean(bucket);
    }
    let series_var = variance(series);
    let strength = if series_var > 0.0 {
        variance(&weekday_means) / series_var
    } else {
        0.0
    };
    (strength, weekday_means)
}

fn z_score_for_service_level(service_level: f64) -> f64 {
    if (service_level - 0.90).abs() < 1e-9 {
        1.28
    } else if (service_level - 0.95).abs() < 1e-9 {
        1.65
    } else if (service_level - 0.99).abs() < 1e-9 {
        2.33
    } else {
        1.65
    }
}

/// `anchor_weekday`: ISO weekday (0=Mon..6=Sun) of the first entry in `series`, needed to
/// align weekday buckets for seasonality.
pub fn forecast(series: &[f64], anchor_weekday: usize, lead_time_days: i64, service_level: f64) -> Forecast {
    let n = series.len();

    if n < 7 {
        return Forecast {
            pattern: DemandPattern::Erratic,
            pattern_confidence: 0.0,
            trend: Trend { direction: TrendDirection::Steady, slope: 0.0, r2: 0.0 },
            mean_daily_demand: mean(series),
            stddev: stddev(series),
            safety_stock: 0,
        };
    }

    if series.iter().all(|v| *v == 0.0) {
        return Forecast {
            pattern: DemandPattern::Steady,
            pattern_confidence: 0.0,
            trend: Trend { direction: TrendDirection::Steady, slope: 0.0, r2: 0.0 },
            mean_daily_demand: 0.0,
            stddev: 0.0,
            safety_stock: 0,
        };
    }

    let filtered = filter_outliers(series);
    let filtered_mean = mean(&filtered);
    let filtered_stddev = stddev(&filtered);
    let cv = if filtered_mean > 0.0 { filtered_stddev / filtered_mean } else { 0.0 };

    let (slope, r2) = ols_trend(&filtered);
    let trend_direction = if slope > 0.05 * filtered_mean.max(1e-9) && r2 >= 0.3 {
        TrendDirection::Growing
    } else if slope < -0.05 * filtered_mean.max(1e-9) && r2 >= 0.3 {
        TrendDirection::Declining
    } else {
        TrendDirection::Steady
    };

    let (season_strength, weekday_means) = if n >= 28 {
        seasonal_strength(&filtered, anchor_weekday)
    } else {
        (0.0, [0.0; 7])
    };
    let is_seasonal = season_strength >= 0.2 && n >= 28;

    let pattern = if cv > 1.0 && trend_direction == TrendDirection::Steady && !is_seasonal {
        DemandPattern::Erratic
    } else if is_seasonal {
        DemandPattern::Seasonal
    } else {
        match trend_direction {
            TrendDirection::Growing => DemandPattern::Growing,
            TrendDirection::Declining => DemandPattern::Declining,
            TrendDirection::Steady => DemandPattern::Steady,
        }
    };

    let confidence = match pattern {
        DemandPattern::Growing | DemandPattern::Declining => r2,
        DemandPattern::Seasonal => season_strength.clamp(0.0, 1.0),
        DemandPattern::Steady => (1.0 - cv / 2.0).clamp(0.0, 1.0),
        DemandPattern::Erratic => ((1.0 - cv) / 2.0).clamp(0.0, 1.0),
    };

    let mean_daily_demand = match pattern {
        DemandPattern::Steady | DemandPattern::Erratic => filtered_mean,
        DemandPattern::Growing | DemandPattern::Declining => filtered_mean + slope * n as f64,
        DemandPattern::Seasonal => {
            let next_weekday = (anchor_weekday + n) % 7;
            let overall_mean = mean(&weekday_means);
            let factor = if overall_mean > 0.0 {
                weekday_means[next_weekday] / overall_mean
            } else {
                1.0
            };
            filtered_mean * factor
        }
    }
    .max(0.0);

    let z = z_score_for_service_level(service_level);
    let safety_stock = (z * filtered_stddev * (lead_time_days.max(0) as f64).sqrt()).ceil() as i64;

    Forecast {
        pattern,
        pattern_confidence: confidence,
        trend: Trend { direction: trend_direction, slope, r2 },
        mean_daily_demand,
        stddev: filtered_stddev,
        safety_stock: safety_stock.max(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_zero_series_is_steady_with_zero_confidence() {
        let series = vec![0.0; 30];
        let f = forecast(&series, 0, 5, 0.95);
        assert_eq!(f.pattern, DemandPattern::Steady);
        assert_eq!(f.pattern_confidence, 0.0);
        assert_eq!(f.mean_daily_demand, 0.0);
        assert_eq!(f.safety_stock, 0);
    }

    #[test]
    fn short_series_is_erratic_with_zero_confidence() {
        let series = vec![3.0, 4.0, 2.0];
        let f = forecast(&series, 0, 5, 0.95);
        assert_eq!(f.pattern, DemandPattern::Erratic);
        assert_eq!(f.pattern_confidence, 0.0);
    }

    #[test]
    fn steady_series_classifies_steady() {
        let series = vec![10.0; 30];
        let f = forecast(&series, 0, 3, 0.95);
        assert_eq!(f.pattern, DemandPattern::Steady);
        assert!((f.mean_daily_demand - 10.0).abs() < 1e-6);
    }

    #[test]
    fn growing_series_detected() {
        let series: Vec<f64> = (0..30).map(|i| 5.0 + i as f64 * 0.8).collect();
        let f = forecast(&series, 0, 3, 0.95);
        assert_eq!(f.pattern, DemandPattern::Growing);
        assert!(f.trend.slope > 0.0);
    }

    #[test]
    fn zscore_table_matches_spec_values() {
        assert_eq!(z_score_for_service_level(0.90), 1.28);
        assert_eq!(z_score_for_service_level(0.95), 1.65);
        assert_eq!(z_score_for_service_level(0.99), 2.33);
        assert_eq!(z_score_for_service_level(0.80), 1.65);
    }

    #[test]
    fn outlier_filter_skipped_below_seven_nonzero_points() {
        let mut series = vec![0.0; 25];
        series[0] = 1.0;
        series[1] = 2.0;
        series[2] = 500.0; // would be an outlier, but only 3 non-zero points
        let filtered = filter_outliers(&series);
        assert_eq!(filtered, series);
    }
}
