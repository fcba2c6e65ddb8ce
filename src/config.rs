use crate::error::{Result, TipsError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppCfg {
    pub feed: FeedCfg,
    pub tips: TipsCfg,
    pub reference: ReferenceCfg,
}

impl AppCfg {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| TipsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedCfg {
    pub base_url: String,
    pub exchange_suffix: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Skip the live feed and score from fallback snapshots only.
    pub offline: bool,
}

impl FeedCfg {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FeedCfg {
    fn default() -> Self {
        Self {
            base_url: "https://stooq.com/q/d/l/".into(),
            exchange_suffix: "au".into(),
            timeout_secs: 10,
            user_agent: concat!("asx_tips/", env!("CARGO_PKG_VERSION")).into(),
            offline: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TipsCfg {
    pub initial_investment: f64,
    pub horizons: Vec<u32>,
    /// How many top-ranked members of a bucket the random pick draws from.
    pub pick_pool: usize,
    pub seed: Option<u64>,
    pub concurrency: usize,
}

impl Default for TipsCfg {
    fn default() -> Self {
        Self {
            initial_investment: 500.0,
            horizons: vec![3, 6, 9, 12],
            pick_pool: 3,
            seed: None,
            concurrency: 8,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ReferenceCfg {
    pub path: Option<PathBuf>,
}
