//! Candidate universe types
//!
//! This module holds:
//! - The static `Candidate` record supplied by reference data
//! - Market-capitalisation buckets used to diversify picks
//! - Price series with their provenance
//! - Sector exclusion

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum observations a series needs before it can be scored.
pub const MIN_SCORING_POINTS: usize = 126;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapBucket {
    Large,
    Mid,
    Small,
}

impl CapBucket {
    /// Iteration order for bucketed selection.
    pub const ALL: [CapBucket; 3] = [CapBucket::Large, CapBucket::Mid, CapBucket::Small];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "large" | "large-cap" | "large cap" => Some(CapBucket::Large),
            "mid" | "mid-cap" | "mid cap" => Some(CapBucket::Mid),
            "small" | "small-cap" | "small cap" => Some(CapBucket::Small),
            _ => None,
        }
    }
}

impl fmt::Display for CapBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CapBucket::Large => "large",
            CapBucket::Mid => "mid",
            CapBucket::Small => "small",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub code: String,
    pub name: String,
    pub sector: String,
    #[serde(rename = "cap", deserialize_with = "deserialize_bucket")]
    pub cap_bucket: CapBucket,
    #[serde(default)]
    pub news_sentiment: f64,
    #[serde(default)]
    pub blog_sentiment: f64,
    #[serde(default)]
    pub report_signal: f64,
    #[serde(default)]
    pub roe_2y_min: f64,
    #[serde(default)]
    pub eps_growth: f64,
    #[serde(default)]
    pub leverage_ratio: f64,
}

// Reference files spell buckets loosely ("Large", "mid-cap", "small cap").
fn deserialize_bucket<'de, D>(deserializer: D) -> Result<CapBucket, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    CapBucket::parse(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unknown market-cap bucket '{raw}'")))
}

impl Candidate {
    /// Profitability and balance-sheet gate applied before any price fetch.
    pub fn is_fundamentally_eligible(&self) -> bool {
        self.roe_2y_min > 0.20 && self.eps_growth > 0.15 && self.leverage_ratio < 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Live,
    Fallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Live => f.write_str("live"),
            Provenance::Fallback => f.write_str("fallback"),
        }
    }
}

/// Daily closes, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub prices: Vec<f64>,
    pub provenance: Provenance,
}

impl PriceSeries {
    pub fn live(prices: Vec<f64>) -> Self {
        Self { prices, provenance: Provenance::Live }
    }

    pub fn fallback(prices: Vec<f64>) -> Self {
        Self { prices, provenance: Provenance::Fallback }
    }

    pub fn is_scoreable(&self) -> bool {
        self.prices.len() >= MIN_SCORING_POINTS
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludedSectors(Vec<String>);

impl ExcludedSectors {
    pub fn new<I, S>(sectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(sectors.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, sector: &str) -> bool {
        self.0.iter().any(|s| s.trim().eq_ignore_ascii_case(sector.trim()))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}
