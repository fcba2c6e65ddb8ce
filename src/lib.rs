//! Ranks a universe of listed companies on momentum, sentiment, fundamentals
//! and volatility, then projects a notional sale value for a diversified pick.

pub mod config;
pub mod error;
pub mod prices;
pub mod projection;
pub mod reference;
pub mod scoring;
pub mod selection;
pub mod stats;
pub mod stocks;
pub mod tips;

pub use error::{Result, TipsError};
pub use projection::project_sell_value;
pub use scoring::score_stock;
pub use tips::{TipEngine, TipOptions, TipReport, TipResult};
