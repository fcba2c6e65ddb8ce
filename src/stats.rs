//! Price statistics used by the scorer.

/// Trading days per year, used to annualise daily volatility.
pub const TRADING_DAYS: f64 = 252.0;

/// Volatility assumed when a series is too short to measure.
pub const DEFAULT_VOLATILITY: f64 = 0.3;

pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Fractional change from `from` to `to`.
///
/// Returns 0.0 instead of failing when `from` is not positive or either input
/// is not finite, so a bad observation contributes neutrally to a score.
pub fn percent_change(from: f64, to: f64) -> f64 {
    if !from.is_finite() || !to.is_finite() || from <= 0.0 {
        return 0.0;
    }
    (to - from) / from
}

/// Annualised sample standard deviation of period-over-period changes.
pub fn annualized_volatility(series: &[f64]) -> f64 {
    let returns: Vec<f64> = series
        .windows(2)
        .map(|w| percent_change(w[0], w[1]))
        .collect();

    if returns.is_empty() {
        return DEFAULT_VOLATILITY;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0).max(1.0);

    variance.sqrt() * TRADING_DAYS.sqrt()
}
