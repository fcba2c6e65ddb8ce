use crate::stats::{annualized_volatility, clamp, percent_change};
use crate::stocks::{Candidate, PriceSeries, Provenance, MIN_SCORING_POINTS};
use serde::Serialize;

/// Observations in the ~3 month return window.
pub const SHORT_WINDOW: usize = 63;
/// Observations in the ~6 month return window, also used for volatility.
pub const MEDIUM_WINDOW: usize = 126;

pub const MIN_ANNUAL_RETURN: f64 = 0.02;
pub const MAX_ANNUAL_RETURN: f64 = 0.35;

/// Clamped inputs to the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubSignals {
    pub momentum: f64,
    pub sentiment: f64,
    pub fundamental: f64,
    pub risk_adjusted: f64,
}

impl SubSignals {
    pub const MOMENTUM_BAND: (f64, f64) = (-0.35, 0.45);
    pub const SENTIMENT_BAND: (f64, f64) = (-0.40, 0.60);
    pub const FUNDAMENTAL_BAND: (f64, f64) = (-0.30, 0.50);
    pub const RISK_ADJUSTED_BAND: (f64, f64) = (-0.40, 0.40);

    pub fn compute(candidate: &Candidate, r3m: f64, r6m: f64, r12m: f64, vol: f64) -> Self {
        let (lo, hi) = Self::MOMENTUM_BAND;
        let momentum = clamp(0.45 * r3m + 0.35 * r6m + 0.20 * r12m, lo, hi);

        let (lo, hi) = Self::SENTIMENT_BAND;
        let sentiment = clamp(
            0.55 * candidate.news_sentiment + 0.45 * candidate.blog_sentiment,
            lo,
            hi,
        );

        let (lo, hi) = Self::FUNDAMENTAL_BAND;
        let fundamental = clamp(
            0.40 * candidate.roe_2y_min + 0.35 * candidate.eps_growth
                - 0.20 * candidate.leverage_ratio,
            lo,
            hi,
        );

        let (lo, hi) = Self::RISK_ADJUSTED_BAND;
        let risk_adjusted = clamp(momentum - 0.5 * vol, lo, hi);

        Self {
            momentum,
            sentiment,
            fundamental,
            risk_adjusted,
        }
    }

    /// Weighted blend; the weights sum to 1.0.
    pub fn composite(&self, report_signal: f64) -> f64 {
        0.35 * self.momentum
            + 0.20 * self.sentiment
            + 0.20 * report_signal
            + 0.15 * self.fundamental
            + 0.10 * self.risk_adjusted
    }
}

/// Map a composite score onto a plausible annual return band.
pub fn annual_return_for(score: f64) -> f64 {
    clamp(
        0.05 + (score + 0.1) * 0.42,
        MIN_ANNUAL_RETURN,
        MAX_ANNUAL_RETURN,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Diagnostics {
    pub r3m: f64,
    pub r6m: f64,
    pub r12m: f64,
    pub vol: f64,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub current_price: f64,
    pub score: f64,
    pub annual_return: f64,
    pub signals: SubSignals,
    pub diagnostics: Diagnostics,
}

impl ScoredCandidate {
    pub fn code(&self) -> &str {
        &self.candidate.code
    }
}

/// Score a candidate against its price history.
///
/// Returns `None` when the series has fewer than 126 observations.
pub fn score_stock(candidate: &Candidate, series: &PriceSeries) -> Option<ScoredCandidate> {
    let prices = &series.prices;
    let n = prices.len();
    if n < MIN_SCORING_POINTS {
        return None;
    }

    let current_price = prices[n - 1];
    let r3m = percent_change(prices[n - SHORT_WINDOW], current_price);
    let r6m = percent_change(prices[n - MEDIUM_WINDOW], current_price);
    let r12m = percent_change(prices[0], current_price);
    let vol = annualized_volatility(&prices[n - MEDIUM_WINDOW..]);

    let signals = SubSignals::compute(candidate, r3m, r6m, r12m, vol);
    let score = signals.composite(candidate.report_signal);

    Some(ScoredCandidate {
        candidate: candidate.clone(),
        current_price,
        score,
        annual_return: annual_return_for(score),
        signals,
        diagnostics: Diagnostics {
            r3m,
            r6m,
            r12m,
            vol,
            provenance: series.provenance,
        },
    })
}
