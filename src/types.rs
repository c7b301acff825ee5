//! Core types and constants

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp type used for record bookkeeping
pub type Timestamp = DateTime<Utc>;

/// Logical date a task or record applies to
pub type RunDate = NaiveDate;

/// Row id of a persisted task
pub type TaskId = i64;

/// Row id of a stock ticker
pub type TickerId = i64;

/// Row id of a stock index
pub type IndexId = i64;

/// Price type (using f64 for precision)
pub type Price = f64;

/// Market capitalization
pub type MarketCap = f64;

/// One day of market data for a ticker, as delivered by a price feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyQuote {
    pub date: RunDate,
    pub close: Price,
    pub market_cap: MarketCap,
}

impl DailyQuote {
    pub fn new(date: RunDate, close: Price, market_cap: MarketCap) -> Self {
        Self {
            date,
            close,
            market_cap,
        }
    }
}

/// A ticker symbol with its listing metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerInfo {
    pub symbol: String,
    pub name: String,
    pub exchange: String,
}
