//! Tip generation: selection plus projections and rationale.

use crate::config::TipsCfg;
use crate::prices::{PriceFeed, PriceResolver};
use crate::projection::{build_projections, Projection};
use crate::reference::ReferenceData;
use crate::scoring::ScoredCandidate;
use crate::selection::{select, SelectionParams};
use crate::stocks::Provenance;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct TipResult {
    #[serde(flatten)]
    pub scored: ScoredCandidate,
    pub projections: Vec<Projection>,
    pub rationale: Vec<String>,
}

impl TipResult {
    pub fn code(&self) -> &str {
        self.scored.code()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TipReport {
    pub generated_at: DateTime<Utc>,
    pub excluded_codes: Vec<String>,
    pub tips: Vec<TipResult>,
}

#[derive(Debug, Clone, Default)]
pub struct TipOptions {
    /// Codes recommended by an earlier run, avoided where possible.
    pub exclude_codes: HashSet<String>,
}

fn whole_percent(fraction: f64) -> i64 {
    (fraction * 100.0).round() as i64
}

pub fn rationale(scored: &ScoredCandidate) -> Vec<String> {
    let d = &scored.diagnostics;
    let c = &scored.candidate;
    let source = match d.provenance {
        Provenance::Live => "live price feed",
        Provenance::Fallback => "local fallback snapshot",
    };

    vec![
        format!(
            "Performance: 3m {}%, 6m {}%",
            whole_percent(d.r3m),
            whole_percent(d.r6m)
        ),
        format!(
            "Sentiment + reports: media/blog signal {:+.2}, report signal {:+.2}",
            scored.signals.sentiment, c.report_signal
        ),
        format!(
            "Fundamentals: ROE {}%, EPS growth {}%, leverage {:.2}",
            whole_percent(c.roe_2y_min),
            whole_percent(c.eps_growth),
            c.leverage_ratio
        ),
        format!("Data source: {source}"),
    ]
}

pub fn to_tip(scored: ScoredCandidate, initial_investment: f64, horizons: &[u32]) -> TipResult {
    let projections = build_projections(initial_investment, scored.annual_return, horizons);
    let rationale = rationale(&scored);
    TipResult {
        scored,
        projections,
        rationale,
    }
}

pub struct TipEngine {
    reference: ReferenceData,
    resolver: PriceResolver,
    cfg: TipsCfg,
}

impl TipEngine {
    pub fn new(reference: ReferenceData, feed: Arc<dyn PriceFeed>, cfg: TipsCfg) -> Self {
        let resolver = PriceResolver::new(feed, reference.fallback_series());
        Self {
            reference,
            resolver,
            cfg,
        }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// One tip per market-cap bucket that has a scoreable candidate, in bucket order.
    pub async fn generate_tips<R: Rng>(&self, options: &TipOptions, rng: &mut R) -> Vec<TipResult> {
        let params = SelectionParams {
            pick_pool: self.cfg.pick_pool,
            concurrency: self.cfg.concurrency,
        };

        let picks = select(
            &self.reference.candidates,
            &self.reference.excluded_sectors,
            &options.exclude_codes,
            &self.resolver,
            params,
            rng,
        )
        .await;

        let tips: Vec<TipResult> = picks
            .into_iter()
            .map(|s| to_tip(s, self.cfg.initial_investment, &self.cfg.horizons))
            .collect();

        info!(
            tips = tips.len(),
            codes = ?tips.iter().map(TipResult::code).collect::<Vec<_>>(),
            "generated tips"
        );
        tips
    }

    pub async fn report<R: Rng>(&self, options: &TipOptions, rng: &mut R) -> TipReport {
        let tips = self.generate_tips(options, rng).await;
        let mut excluded_codes: Vec<String> = options.exclude_codes.iter().cloned().collect();
        excluded_codes.sort();
        TipReport {
            generated_at: Utc::now(),
            excluded_codes,
            tips,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::score_stock;
    use crate::stocks::{CapBucket, Candidate, PriceSeries};

    fn scored(provenance_live: bool) -> ScoredCandidate {
        let c = Candidate {
            code: "PME".into(),
            name: "Pro Medicus".into(),
            sector: "Healthcare".into(),
            cap_bucket: CapBucket::Mid,
            news_sentiment: 0.4,
            blog_sentiment: 0.35,
            report_signal: 0.65,
            roe_2y_min: 0.31,
            eps_growth: 0.28,
            leverage_ratio: 0.05,
        };
        let prices: Vec<f64> = (0..252).map(|i| 100.0 + i as f64 * 0.5).collect();
        let series = if provenance_live {
            PriceSeries::live(prices)
        } else {
            PriceSeries::fallback(prices)
        };
        score_stock(&c, &series).unwrap()
    }

    #[test]
    fn rationale_mentions_returns_and_source() {
        let lines = rationale(&scored(false));
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Performance: 3m "));
        assert!(lines[2].contains("ROE 31%"));
        assert_eq!(lines[3], "Data source: local fallback snapshot");
        assert_eq!(rationale(&scored(true))[3], "Data source: live price feed");
    }

    #[test]
    fn tip_carries_projection_per_horizon() {
        let s = scored(true);
        let annual = s.annual_return;
        let tip = to_tip(s, 500.0, &[3, 6, 9, 12]);
        assert_eq!(tip.projections.len(), 4);
        assert!((tip.projections[3].projected_sell_value - 500.0 * (1.0 + annual)).abs() < 1e-9);
    }

    #[test]
    fn tip_serializes_flat() {
        let tip = to_tip(scored(true), 500.0, &[12]);
        let v = serde_json::to_value(&tip).unwrap();
        assert_eq!(v["code"], "PME");
        assert_eq!(v["diagnostics"]["provenance"], "live");
        assert!(v["projections"][0]["growth_pct"].is_f64());
    }
}
