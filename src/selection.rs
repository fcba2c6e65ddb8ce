//! Candidate filtering, ranking and bucketed selection.

use crate::prices::PriceResolver;
use crate::scoring::{score_stock, ScoredCandidate};
use crate::stocks::{CapBucket, Candidate, ExcludedSectors};
use futures::stream::{self, StreamExt};
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy)]
pub struct SelectionParams {
    /// Top-ranked members of a bucket the random pick draws from.
    pub pick_pool: usize,
    /// Maximum in-flight price lookups.
    pub concurrency: usize,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            pick_pool: 3,
            concurrency: 8,
        }
    }
}

pub fn is_eligible(candidate: &Candidate, excluded_sectors: &ExcludedSectors) -> bool {
    !excluded_sectors.contains(&candidate.sector) && candidate.is_fundamentally_eligible()
}

/// Candidates worth fetching prices for.
pub fn filter_eligible(universe: &[Candidate], excluded_sectors: &ExcludedSectors) -> Vec<Candidate> {
    universe
        .iter()
        .filter(|c| is_eligible(c, excluded_sectors))
        .cloned()
        .collect()
}

/// Resolve prices and score every candidate, keeping input order.
///
/// Candidates whose series is too short are dropped.
pub async fn score_all(
    candidates: &[Candidate],
    resolver: &PriceResolver,
    concurrency: usize,
) -> Vec<ScoredCandidate> {
    stream::iter(candidates)
        .map(|candidate| async move {
            let series = resolver.resolve(&candidate.code).await;
            let scored = score_stock(candidate, &series);
            if scored.is_none() {
                debug!(
                    code = %candidate.code,
                    points = series.prices.len(),
                    "not enough history to score, dropping"
                );
            }
            scored
        })
        .buffered(concurrency.max(1))
        .filter_map(|scored| async move { scored })
        .collect()
        .await
}

/// Sort by score, highest first. Equal scores fall back to code order.
pub fn rank(mut scored: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.code().cmp(b.code()))
    });
    scored
}

/// Pick one candidate per market-cap bucket from a ranked list.
///
/// Within a bucket the pick is drawn at random from the best `pick_pool`
/// candidates not in `exclude_codes`. When every member of the bucket is
/// excluded, the bucket's top-ranked candidate is used anyway.
pub fn pick_per_bucket<R: Rng>(
    ranked: &[ScoredCandidate],
    exclude_codes: &HashSet<String>,
    pick_pool: usize,
    rng: &mut R,
) -> Vec<ScoredCandidate> {
    let mut chosen_codes: HashSet<&str> = HashSet::new();
    let mut picks = Vec::with_capacity(CapBucket::ALL.len());

    for bucket in CapBucket::ALL {
        let members: Vec<&ScoredCandidate> = ranked
            .iter()
            .filter(|s| s.candidate.cap_bucket == bucket && !chosen_codes.contains(s.code()))
            .collect();

        let Some(top) = members.first() else {
            debug!(bucket = %bucket, "no scoreable candidates in bucket");
            continue;
        };

        let fresh: Vec<&ScoredCandidate> = members
            .iter()
            .copied()
            .filter(|s| !exclude_codes.contains(s.code()))
            .collect();

        let pick = if fresh.is_empty() {
            debug!(bucket = %bucket, code = %top.code(), "all bucket members excluded, repeating top pick");
            *top
        } else {
            let pool = &fresh[..pick_pool.max(1).min(fresh.len())];
            pool[rng.gen_range(0..pool.len())]
        };

        debug!(bucket = %bucket, code = %pick.code(), score = pick.score, "bucket pick");
        chosen_codes.insert(pick.code());
        picks.push(pick.clone());
    }

    picks
}

/// Filter, score, rank and pick a diversified set of candidates.
///
/// The result holds at most one candidate per bucket, in bucket order.
pub async fn select<R: Rng>(
    universe: &[Candidate],
    excluded_sectors: &ExcludedSectors,
    exclude_codes: &HashSet<String>,
    resolver: &PriceResolver,
    params: SelectionParams,
    rng: &mut R,
) -> Vec<ScoredCandidate> {
    let eligible = filter_eligible(universe, excluded_sectors);
    info!(
        universe = universe.len(),
        eligible = eligible.len(),
        "filtered candidate universe"
    );

    let scored = score_all(&eligible, resolver, params.concurrency).await;
    let ranked = rank(scored);
    info!(scored = ranked.len(), "ranked candidates");

    pick_per_bucket(&ranked, exclude_codes, params.pick_pool, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{Diagnostics, SubSignals};
    use crate::stocks::Provenance;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scored(code: &str, bucket: CapBucket, score: f64) -> ScoredCandidate {
        ScoredCandidate {
            candidate: Candidate {
                code: code.into(),
                name: code.into(),
                sector: "Materials".into(),
                cap_bucket: bucket,
                news_sentiment: 0.0,
                blog_sentiment: 0.0,
                report_signal: 0.0,
                roe_2y_min: 0.3,
                eps_growth: 0.3,
                leverage_ratio: 0.1,
            },
            current_price: 10.0,
            score,
            annual_return: 0.1,
            signals: SubSignals {
                momentum: 0.0,
                sentiment: 0.0,
                fundamental: 0.0,
                risk_adjusted: 0.0,
            },
            diagnostics: Diagnostics {
                r3m: 0.0,
                r6m: 0.0,
                r12m: 0.0,
                vol: 0.3,
                provenance: Provenance::Fallback,
            },
        }
    }

    fn codes(picks: &[ScoredCandidate]) -> Vec<&str> {
        picks.iter().map(|p| p.code()).collect()
    }

    #[test]
    fn rank_sorts_descending_with_code_tiebreak() {
        let ranked = rank(vec![
            scored("CCC", CapBucket::Large, 0.1),
            scored("BBB", CapBucket::Large, 0.3),
            scored("AAA", CapBucket::Large, 0.3),
        ]);
        assert_eq!(codes(&ranked), vec!["AAA", "BBB", "CCC"]);
    }

    #[test]
    fn pool_of_one_always_takes_the_leader() {
        let ranked = rank(vec![
            scored("S1", CapBucket::Small, 0.1),
            scored("M1", CapBucket::Mid, 0.5),
            scored("L2", CapBucket::Large, 0.2),
            scored("L1", CapBucket::Large, 0.4),
            scored("M2", CapBucket::Mid, 0.3),
        ]);
        let mut rng = StdRng::seed_from_u64(1);
        let picks = pick_per_bucket(&ranked, &HashSet::new(), 1, &mut rng);
        assert_eq!(codes(&picks), vec!["L1", "M1", "S1"]);
    }

    #[test]
    fn empty_bucket_contributes_nothing() {
        let ranked = rank(vec![scored("L1", CapBucket::Large, 0.4), scored("S1", CapBucket::Small, 0.1)]);
        let mut rng = StdRng::seed_from_u64(1);
        let picks = pick_per_bucket(&ranked, &HashSet::new(), 3, &mut rng);
        assert_eq!(codes(&picks), vec!["L1", "S1"]);
    }

    #[test]
    fn random_pick_stays_within_top_pool() {
        let ranked = rank(
            (0..6)
                .map(|i| scored(&format!("L{i}"), CapBucket::Large, 1.0 - i as f64 * 0.1))
                .collect(),
        );
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picks = pick_per_bucket(&ranked, &HashSet::new(), 3, &mut rng);
            assert!(["L0", "L1", "L2"].contains(&picks[0].code()));
        }
    }

    #[test]
    fn same_seed_same_picks() {
        let ranked = rank(
            (0..6)
                .map(|i| scored(&format!("M{i}"), CapBucket::Mid, i as f64))
                .collect(),
        );
        let a = pick_per_bucket(&ranked, &HashSet::new(), 3, &mut StdRng::seed_from_u64(9));
        let b = pick_per_bucket(&ranked, &HashSet::new(), 3, &mut StdRng::seed_from_u64(9));
        assert_eq!(codes(&a), codes(&b));
    }

    #[test]
    fn excluded_codes_are_avoided() {
        let ranked = rank(vec![
            scored("L1", CapBucket::Large, 0.9),
            scored("L2", CapBucket::Large, 0.5),
        ]);
        let exclude: HashSet<String> = ["L1".to_string()].into();
        for seed in 0..20 {
            let picks = pick_per_bucket(&ranked, &exclude, 3, &mut StdRng::seed_from_u64(seed));
            assert_eq!(codes(&picks), vec!["L2"]);
        }
    }

    #[test]
    fn fully_excluded_bucket_repeats_top_ranked() {
        let ranked = rank(vec![
            scored("L1", CapBucket::Large, 0.2),
            scored("L2", CapBucket::Large, 0.7),
        ]);
        let exclude: HashSet<String> = ["L1".to_string(), "L2".to_string()].into();
        let picks = pick_per_bucket(&ranked, &exclude, 3, &mut StdRng::seed_from_u64(3));
        assert_eq!(codes(&picks), vec!["L2"]);
    }

    #[test]
    fn eligibility_checks_sector_and_fundamentals() {
        let excluded = ExcludedSectors::new(["Airlines"]);
        let mut c = scored("QAN", CapBucket::Large, 0.0).candidate;
        assert!(is_eligible(&c, &excluded));
        c.sector = "Airlines".into();
        assert!(!is_eligible(&c, &excluded));
        c.sector = "Materials".into();
        c.leverage_ratio = 1.0;
        assert!(!is_eligible(&c, &excluded));
    }
}
