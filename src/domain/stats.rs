//! Shared numeric helpers for the analytics components.
//!
//! All standard deviations in this crate are population deviations (divide
//! by n, not n-1), matching the reporting contract.

/// Mean of a slice; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 for fewer than two values.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Simple moving average of the trailing `period` values; None when the
/// series is shorter than the period.
pub fn trailing_sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    Some(mean(&values[values.len() - period..]))
}

/// Daily percent returns between consecutive values, skipping steps where
/// the prior value is not strictly positive.
pub fn percent_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0] * 100.0)
        .collect()
}

/// Floor to 4 decimal places. Share counts are never rounded up: rounding a
/// risk-derived quantity upward would increase exposure past the risk
/// budget.
pub fn floor_4dp(value: f64) -> f64 {
    (value * 10_000.0).floor() / 10_000.0
}
