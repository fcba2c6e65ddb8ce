use std::path::PathBuf;
use thiserror::Error;

/// Failures that can escape a tips run.
///
/// Per-candidate problems (feed outages, short series) never reach this type;
/// they degrade to fallback data or a dropped candidate instead.
#[derive(Debug, Error)]
pub enum TipsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("reference data parse error: {0}")]
    ReferenceParse(#[from] serde_json::Error),

    #[error("invalid reference data: {0}")]
    InvalidReference(String),

    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, TipsError>;
