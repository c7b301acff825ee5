//! External market data feed
//!
//! The price feed is an unreliable external collaborator: a failure for one
//! ticker must never abort the batch. [`refresh_prices`] isolates failures
//! per ticker and skips days already present in the store.

pub mod universe;
#[cfg(feature = "async")]
pub mod yahoo;

pub use universe::{CsvUniverse, TickerUniverse};
#[cfg(feature = "async")]
pub use yahoo::{BlockingYahooFeed, YahooFeed};

use crate::error::Result;
use crate::store::Store;
use crate::types::{DailyQuote, RunDate};
use chrono::Duration;
use hashbrown::{HashMap, HashSet};

/// Trait for daily price/market-cap providers
pub trait PriceFeed: Send + Sync {
    /// Fetch daily quotes for one ticker over [start, end], both inclusive
    fn fetch_daily(&self, ticker: &str, start: RunDate, end: RunDate) -> Result<Vec<DailyQuote>>;

    /// Get the feed name
    fn name(&self) -> &str;
}

/// What one price refresh did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Tickers for which at least one new row was stored
    pub tickers_updated: usize,
    pub tickers_failed: usize,
    /// True when the store already had a full day and nothing was fetched
    pub skipped: bool,
}

/// Pull quotes for every known ticker up to `target_date`.
///
/// Short-circuits when every ticker already has a row for `target_date`.
/// A ticker whose fetch fails is logged and skipped; the rest of the batch
/// proceeds. Rows already present for a (ticker, date) are not duplicated.
pub fn refresh_prices(
    store: &mut Store,
    feed: &dyn PriceFeed,
    target_date: RunDate,
    lookback_days: i64,
) -> Result<FetchReport> {
    let mut report = FetchReport::default();

    if store.has_prices_for_all(target_date)? {
        log::debug!("Prices already present for {}, skipping fetch", target_date);
        report.skipped = true;
        return Ok(report);
    }

    let start = target_date - Duration::days(lookback_days);
    for ticker in store.all_tickers()? {
        let quotes = match feed.fetch_daily(&ticker.ticker, start, target_date) {
            Ok(quotes) => quotes,
            Err(e) => {
                log::warn!("Failed to fetch {} from {}: {}", ticker.ticker, feed.name(), e);
                report.tickers_failed += 1;
                continue;
            }
        };

        let mut inserted = 0;
        for quote in quotes {
            if store.has_price(ticker.id, quote.date)? {
                continue;
            }
            store.insert_daily_price(ticker.id, quote.date, quote.close, quote.market_cap)?;
            inserted += 1;
        }
        if inserted > 0 {
            report.tickers_updated += 1;
        }
    }

    Ok(report)
}

/// In-memory price feed (for testing and offline runs)
#[derive(Default)]
pub struct InMemoryPriceFeed {
    quotes: HashMap<String, Vec<DailyQuote>>,
    failing: HashSet<String>,
}

impl InMemoryPriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a quote for a ticker
    pub fn add_quote(&mut self, ticker: &str, quote: DailyQuote) {
        self.quotes.entry(ticker.to_string()).or_default().push(quote);
    }

    /// Make every fetch for the ticker fail
    pub fn fail_ticker(&mut self, ticker: &str) {
        self.failing.insert(ticker.to_string());
    }
}

impl PriceFeed for InMemoryPriceFeed {
    fn fetch_daily(&self, ticker: &str, start: RunDate, end: RunDate) -> Result<Vec<DailyQuote>> {
        if self.failing.contains(ticker) {
            return Err(crate::error::CapweightError::DataError(format!(
                "Feed unavailable for {}",
                ticker
            )));
        }
        let quotes = self
            .quotes
            .get(ticker)
            .map(|all| {
                all.iter()
                    .filter(|q| q.date >= start && q.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(quotes)
    }

    fn name(&self) -> &str {
        "InMemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_refresh_stores_quotes() {
        let mut store = Store::open_in_memory().unwrap();
        let d = date(2024, 1, 2);
        store.upsert_ticker("AAA", "A Corp", "NASDAQ").unwrap();

        let mut feed = InMemoryPriceFeed::new();
        feed.add_quote("AAA", DailyQuote::new(d, 10.0, 100.0));

        let report = refresh_prices(&mut store, &feed, d, 30).unwrap();
        assert_eq!(report.tickers_updated, 1);
        assert_eq!(report.tickers_failed, 0);
        assert!(!report.skipped);

        assert_eq!(store.top_by_market_cap(d, 5).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_ticker_does_not_abort_batch() {
        let mut store = Store::open_in_memory().unwrap();
        let d = date(2024, 1, 2);
        store.upsert_ticker("BAD", "Bad Corp", "NASDAQ").unwrap();
        let good = store.upsert_ticker("AAA", "A Corp", "NASDAQ").unwrap();

        let mut feed = InMemoryPriceFeed::new();
        feed.fail_ticker("BAD");
        feed.add_quote("AAA", DailyQuote::new(d, 10.0, 100.0));

        let report = refresh_prices(&mut store, &feed, d, 30).unwrap();
        assert_eq!(report.tickers_updated, 1);
        assert_eq!(report.tickers_failed, 1);
        assert!(store.has_price(good, d).unwrap());
    }

    #[test]
    fn test_quoteless_ticker_not_counted_as_updated() {
        let mut store = Store::open_in_memory().unwrap();
        store.upsert_ticker("AAA", "A Corp", "NASDAQ").unwrap();

        // The feed knows nothing about AAA and returns an empty batch
        let feed = InMemoryPriceFeed::new();
        let report = refresh_prices(&mut store, &feed, date(2024, 1, 2), 30).unwrap();

        assert_eq!(report.tickers_updated, 0);
        assert_eq!(report.tickers_failed, 0);
        assert!(!report.skipped);
    }

    #[test]
    fn test_refresh_skips_complete_day() {
        let mut store = Store::open_in_memory().unwrap();
        let d = date(2024, 1, 2);
        let a = store.upsert_ticker("AAA", "A Corp", "NASDAQ").unwrap();
        store.insert_daily_price(a, d, 10.0, 100.0).unwrap();

        // Feed would fail, but the presence check short-circuits first
        let mut feed = InMemoryPriceFeed::new();
        feed.fail_ticker("AAA");

        let report = refresh_prices(&mut store, &feed, d, 30).unwrap();
        assert!(report.skipped);
        assert_eq!(report.tickers_failed, 0);
    }

    #[test]
    fn test_refresh_does_not_duplicate_rows() {
        let mut store = Store::open_in_memory().unwrap();
        let d1 = date(2024, 1, 2);
        let d2 = date(2024, 1, 3);
        let a = store.upsert_ticker("AAA", "A Corp", "NASDAQ").unwrap();
        store.insert_daily_price(a, d1, 10.0, 100.0).unwrap();

        let mut feed = InMemoryPriceFeed::new();
        feed.add_quote("AAA", DailyQuote::new(d1, 10.0, 100.0));
        feed.add_quote("AAA", DailyQuote::new(d2, 11.0, 100.0));

        refresh_prices(&mut store, &feed, d2, 30).unwrap();
        assert!(store.has_price(a, d2).unwrap());
        // d1 row was present before the refresh and stays single
        assert_eq!(store.close_prices_of_top(d1, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_in_memory_feed_range_filter() {
        let mut feed = InMemoryPriceFeed::new();
        feed.add_quote("AAA", DailyQuote::new(date(2024, 1, 1), 9.0, 100.0));
        feed.add_quote("AAA", DailyQuote::new(date(2024, 1, 5), 10.0, 100.0));

        let quotes = feed
            .fetch_daily("AAA", date(2024, 1, 2), date(2024, 1, 6))
            .unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].date, date(2024, 1, 5));
    }
}
