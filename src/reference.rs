//! Reference data loading
//!
//! The universe, excluded sectors and fallback price snapshots come from a JSON
//! document. A default document is compiled into the binary; a file on disk can
//! replace it.

use crate::error::{Result, TipsError};
use crate::stocks::{Candidate, ExcludedSectors};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

const BUNDLED: &str = include_str!("../data/reference.json");

static CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{2,5}$").expect("code pattern is a valid literal"));

fn is_valid_code(code: &str) -> bool {
    CODE_PATTERN.is_match(code)
}

/// A locally stored price history used when the live feed is unusable.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FallbackSnapshot {
    Prices {
        prices: Vec<f64>,
    },
    /// Compact description expanded into a deterministic daily series.
    Synthetic {
        start: f64,
        annual_drift: f64,
        #[serde(default)]
        wobble: f64,
        days: usize,
    },
}

impl FallbackSnapshot {
    /// Checks the snapshot describes a series of positive, finite prices.
    fn validate(&self, code: &str) -> Result<()> {
        if let FallbackSnapshot::Synthetic { wobble, .. } = self {
            if !wobble.is_finite() || *wobble < 0.0 {
                return Err(TipsError::InvalidReference(format!(
                    "fallback snapshot for '{code}' has negative or non-finite wobble {wobble}"
                )));
            }
        }

        if let Some((i, p)) = self
            .expand()
            .into_iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || *p <= 0.0)
        {
            return Err(TipsError::InvalidReference(format!(
                "fallback snapshot for '{code}' has non-positive or non-finite price {p} at index {i}"
            )));
        }
        Ok(())
    }

    pub fn expand(&self) -> Vec<f64> {
        match self {
            FallbackSnapshot::Prices { prices } => prices.clone(),
            FallbackSnapshot::Synthetic { start, annual_drift, wobble, days } => (0..*days)
                .map(|i| {
                    let t = i as f64;
                    let trend = start * (annual_drift * t / 252.0).exp();
                    let swing = 1.0 + wobble * ((t * 0.21).sin() + 0.5 * (t * 0.053).cos());
                    trend * swing
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceData {
    #[serde(default)]
    pub excluded_sectors: ExcludedSectors,
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub fallback: HashMap<String, FallbackSnapshot>,
}

impl ReferenceData {
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| TipsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let data: ReferenceData = serde_json::from_str(contents)?;
        data.validate()?;
        Ok(data)
    }

    fn validate(&self) -> Result<()> {
        if self.candidates.is_empty() {
            return Err(TipsError::InvalidReference("candidate universe is empty".into()));
        }

        let mut seen = HashSet::new();
        for c in &self.candidates {
            if !is_valid_code(&c.code) {
                return Err(TipsError::InvalidReference(format!(
                    "candidate code '{}' is not a valid exchange code",
                    c.code
                )));
            }
            if !seen.insert(c.code.as_str()) {
                return Err(TipsError::InvalidReference(format!(
                    "duplicate candidate code '{}'",
                    c.code
                )));
            }
        }

        for (code, snap) in &self.fallback {
            snap.validate(code)?;
        }
        Ok(())
    }

    /// Expanded fallback series for every code that has a snapshot.
    pub fn fallback_series(&self) -> HashMap<String, Vec<f64>> {
        self.fallback
            .iter()
            .map(|(code, snap)| (code.clone(), snap.expand()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stocks::{CapBucket, MIN_SCORING_POINTS};

    #[test]
    fn bundled_data_is_valid() {
        let data = ReferenceData::bundled().unwrap();
        assert!(data.excluded_sectors.contains("Airlines"));
        for bucket in CapBucket::ALL {
            assert!(data.candidates.iter().any(|c| c.cap_bucket == bucket));
        }
    }

    #[test]
    fn bundled_fallbacks_are_scoreable_and_positive() {
        let data = ReferenceData::bundled().unwrap();
        for (code, series) in data.fallback_series() {
            assert!(series.len() >= MIN_SCORING_POINTS, "{code} too short");
            assert!(series.iter().all(|p| p.is_finite() && *p > 0.0), "{code} has bad prices");
        }
    }

    #[test]
    fn explicit_prices_snapshot() {
        let json = r#"{"candidates": [{"code": "ABC", "name": "A", "sector": "S", "cap": "small"}],
            "fallback": {"ABC": {"prices": [1.0, 2.0, 3.0]}}}"#;
        let data = ReferenceData::from_json(json).unwrap();
        assert_eq!(data.fallback_series()["ABC"], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn synthetic_snapshot_is_deterministic() {
        let snap = FallbackSnapshot::Synthetic { start: 10.0, annual_drift: 0.1, wobble: 0.02, days: 5 };
        assert_eq!(snap.expand(), snap.expand());
        assert_eq!(snap.expand().len(), 5);
    }

    #[test]
    fn rejects_empty_universe() {
        let err = ReferenceData::from_json(r#"{"candidates": []}"#).unwrap_err();
        assert!(matches!(err, TipsError::InvalidReference(_)));
    }

    #[test]
    fn rejects_duplicate_codes() {
        let json = r#"{"candidates": [
            {"code": "ABC", "name": "A", "sector": "S", "cap": "small"},
            {"code": "ABC", "name": "B", "sector": "S", "cap": "mid"}]}"#;
        assert!(matches!(
            ReferenceData::from_json(json).unwrap_err(),
            TipsError::InvalidReference(_)
        ));
    }

    #[test]
    fn rejects_lowercase_code() {
        let json = r#"{"candidates": [{"code": "abc", "name": "A", "sector": "S", "cap": "small"}]}"#;
        assert!(ReferenceData::from_json(json).is_err());
    }

    #[test]
    fn code_pattern_accepts_exchange_codes() {
        for code in ["BHP", "MP1", "CBA", "XYZ12"] {
            assert!(is_valid_code(code), "{code}");
        }
        for code in ["B", "TOOLONG", "bh p", ""] {
            assert!(!is_valid_code(code), "{code}");
        }
    }

    fn with_fallback(snapshot: &str) -> String {
        format!(
            r#"{{"candidates": [{{"code": "ABC", "name": "A", "sector": "S", "cap": "small"}}],
                "fallback": {{"ABC": {snapshot}}}}}"#
        )
    }

    #[test]
    fn rejects_non_positive_explicit_prices() {
        for snapshot in [r#"{"prices": [1.0, 0.0, 2.0]}"#, r#"{"prices": [1.0, -4.5]}"#] {
            assert!(matches!(
                ReferenceData::from_json(&with_fallback(snapshot)).unwrap_err(),
                TipsError::InvalidReference(_)
            ));
        }
    }

    #[test]
    fn rejects_wobble_that_drives_prices_negative() {
        let json = with_fallback(r#"{"start": 10.0, "annual_drift": 0.1, "wobble": 1.0, "days": 252}"#);
        assert!(matches!(
            ReferenceData::from_json(&json).unwrap_err(),
            TipsError::InvalidReference(_)
        ));
    }

    #[test]
    fn rejects_negative_wobble() {
        let json = with_fallback(r#"{"start": 10.0, "annual_drift": 0.1, "wobble": -0.01, "days": 252}"#);
        assert!(matches!(
            ReferenceData::from_json(&json).unwrap_err(),
            TipsError::InvalidReference(_)
        ));
    }

    #[test]
    fn rejects_non_positive_synthetic_start() {
        let json = with_fallback(r#"{"start": 0.0, "annual_drift": 0.1, "wobble": 0.01, "days": 10}"#);
        assert!(ReferenceData::from_json(&json).is_err());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            ReferenceData::from_json("{not json").unwrap_err(),
            TipsError::ReferenceParse(_)
        ));
    }
}
