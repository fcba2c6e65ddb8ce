use crate::stats::percent_change;
use serde::Serialize;

/// Notional stake used for the projected sale values.
pub const INITIAL_INVESTMENT: f64 = 500.0;

/// Month counts a tip is projected over.
pub const HORIZONS: [u32; 4] = [3, 6, 9, 12];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    pub months: u32,
    pub projected_sell_value: f64,
    pub growth_pct: f64,
}

/// Value of `initial_investment` after compounding `annual_return` for `months`.
pub fn project_sell_value(initial_investment: f64, annual_return: f64, months: u32) -> f64 {
    let years = f64::from(months) / 12.0;
    initial_investment * (1.0 + annual_return).powf(years)
}

pub fn build_projections(initial_investment: f64, annual_return: f64, horizons: &[u32]) -> Vec<Projection> {
    horizons
        .iter()
        .map(|&months| {
            let value = project_sell_value(initial_investment, annual_return, months);
            Projection {
                months,
                projected_sell_value: value,
                growth_pct: percent_change(initial_investment, value),
            }
        })
        .collect()
}
