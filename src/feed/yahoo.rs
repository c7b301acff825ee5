//! Yahoo Finance price feed
//!
//! Downloads daily close prices as CSV plus a market-cap snapshot per
//! ticker. The client is async; [`BlockingYahooFeed`] drives it from the
//! synchronous pipeline and satisfies [`PriceFeed`](super::PriceFeed).

use super::PriceFeed;
use crate::error::{CapweightError, Result};
use crate::types::{DailyQuote, MarketCap, RunDate};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const YAHOO_DOWNLOAD_URL: &str = "https://query1.finance.yahoo.com/v7/finance/download";
const YAHOO_QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

/// Yahoo Finance data feed (no API key required)
pub struct YahooFeed {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct YahooRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Adj Close")]
    adj_close: f64,
}

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    result: Vec<QuoteResult>,
}

#[derive(Debug, Deserialize)]
struct QuoteResult {
    #[serde(rename = "marketCap")]
    market_cap: Option<f64>,
}

impl YahooFeed {
    /// Create a new Yahoo Finance feed
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| CapweightError::DataError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Fetch daily quotes for one ticker over [start, end]
    pub async fn fetch_daily(
        &self,
        ticker: &str,
        start: RunDate,
        end: RunDate,
    ) -> Result<Vec<DailyQuote>> {
        let period1 = start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc().timestamp();
        let period2 = end.and_hms_opt(23, 59, 59).unwrap_or_default().and_utc().timestamp();

        let url = format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            YAHOO_DOWNLOAD_URL, ticker, period1, period2
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CapweightError::DataError(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(CapweightError::DataError(format!(
                "Yahoo Finance returned error: {}",
                response.status()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| CapweightError::DataError(format!("Failed to read response: {}", e)))?;

        let market_cap = self.fetch_market_cap(ticker).await.unwrap_or(0.0);
        Self::parse_csv_data(&text, market_cap)
    }

    /// Latest market-cap snapshot for a ticker
    async fn fetch_market_cap(&self, ticker: &str) -> Result<MarketCap> {
        let url = format!("{}?symbols={}", YAHOO_QUOTE_URL, ticker);
        let envelope: QuoteEnvelope = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CapweightError::DataError(format!("HTTP request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| CapweightError::DataError(format!("Bad quote response: {}", e)))?;

        let market_cap = envelope
            .quote_response
            .result
            .first()
            .and_then(|r| r.market_cap)
            .unwrap_or(0.0);
        Ok(market_cap)
    }

    fn parse_csv_data(csv_text: &str, market_cap: MarketCap) -> Result<Vec<DailyQuote>> {
        let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
        let mut quotes = Vec::new();

        for result in reader.deserialize() {
            let row: YahooRow = result
                .map_err(|e| CapweightError::DataError(format!("CSV parse error: {}", e)))?;

            let date = chrono::NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
                .map_err(|e| CapweightError::DataError(format!("Date parse error: {}", e)))?;

            // Adjusted close absorbs splits and dividends
            quotes.push(DailyQuote::new(date, row.adj_close, market_cap));
        }

        Ok(quotes)
    }
}

/// [`YahooFeed`] behind a blocking facade.
///
/// Owns a single-threaded runtime, so PRICE_FETCH tasks can use the live
/// feed through the synchronous [`PriceFeed`] trait.
pub struct BlockingYahooFeed {
    inner: YahooFeed,
    runtime: tokio::runtime::Runtime,
}

impl BlockingYahooFeed {
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            inner: YahooFeed::new()?,
            runtime,
        })
    }
}

impl PriceFeed for BlockingYahooFeed {
    fn fetch_daily(&self, ticker: &str, start: RunDate, end: RunDate) -> Result<Vec<DailyQuote>> {
        self.runtime
            .block_on(self.inner.fetch_daily(ticker, start, end))
    }

    fn name(&self) -> &str {
        "Yahoo"
    }
}
