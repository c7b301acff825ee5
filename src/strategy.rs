//! Constituent selection strategies
//!
//! A strategy ranks the ticker universe for one date and returns the top-N
//! candidates. Strategies are trait objects behind a kind-keyed factory so
//! new ranking rules plug in without touching the index builder.

use crate::error::{CapweightError, Result};
use crate::store::Store;
use crate::types::{RunDate, TickerId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which selection rule an index is configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    MarketCap,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::MarketCap => "MARKET_CAP",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "MARKET_CAP" => Ok(StrategyKind::MarketCap),
            other => Err(CapweightError::ConfigError(format!(
                "Unsupported index strategy: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for constituent selection strategies
pub trait SelectionStrategy: Send + Sync {
    /// Rank tickers for `date` and return the top `top_n` ids, best first.
    ///
    /// Fewer than `top_n` tickers with data is not an error; all available
    /// candidates are returned.
    fn select(&self, store: &Store, date: RunDate, top_n: u32) -> Result<Vec<TickerId>>;

    /// Get strategy name
    fn name(&self) -> &str;
}

/// Select the largest tickers by market-capitalization snapshot
pub struct MarketCapStrategy;

impl SelectionStrategy for MarketCapStrategy {
    fn select(&self, store: &Store, date: RunDate, top_n: u32) -> Result<Vec<TickerId>> {
        store.top_by_market_cap(date, top_n)
    }

    fn name(&self) -> &str {
        "MarketCap"
    }
}

/// Get the strategy implementation for a configured kind
pub fn strategy_for(kind: StrategyKind) -> Box<dyn SelectionStrategy> {
    match kind {
        StrategyKind::MarketCap => Box::new(MarketCapStrategy),
    }
}
