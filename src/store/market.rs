//! Ticker and daily price persistence

use super::Store;
use crate::error::Result;
use crate::types::{MarketCap, Price, RunDate, TickerId};
use rusqlite::{params, OptionalExtension, Row};

/// A listed ticker known to the store
#[derive(Debug, Clone, PartialEq)]
pub struct StockTicker {
    pub id: TickerId,
    pub ticker: String,
    pub name: String,
    pub exchange: String,
}

fn ticker_from_row(row: &Row<'_>) -> rusqlite::Result<StockTicker> {
    Ok(StockTicker {
        id: row.get(0)?,
        ticker: row.get(1)?,
        name: row.get(2)?,
        exchange: row.get(3)?,
    })
}

impl Store {
    /// Insert a ticker if it is not already present; returns its id either way
    pub fn upsert_ticker(&mut self, ticker: &str, name: &str, exchange: &str) -> Result<TickerId> {
        let existing: Option<TickerId> = self
            .conn()
            .query_row(
                "SELECT id FROM stock_ticker WHERE ticker = ?1 AND exchange = ?2",
                params![ticker, exchange],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        self.conn().execute(
            "INSERT INTO stock_ticker (ticker, name, exchange) VALUES (?1, ?2, ?3)",
            params![ticker, name, exchange],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// All tickers in the universe
    pub fn all_tickers(&self) -> Result<Vec<StockTicker>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, ticker, name, exchange FROM stock_ticker ORDER BY id")?;
        let tickers = stmt
            .query_map([], ticker_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(tickers)
    }

    /// Record one day of market data for a ticker
    pub fn insert_daily_price(
        &mut self,
        stock_ticker_id: TickerId,
        date: RunDate,
        close_price: Price,
        market_cap: MarketCap,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO daily_prices (stock_ticker_id, date, close_price, market_cap)
             VALUES (?1, ?2, ?3, ?4)",
            params![stock_ticker_id, date, close_price, market_cap],
        )?;
        Ok(())
    }

    /// Whether a ticker already has a price row for the date
    pub fn has_price(&self, stock_ticker_id: TickerId, date: RunDate) -> Result<bool> {
        let row: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM daily_prices WHERE stock_ticker_id = ?1 AND date = ?2 LIMIT 1",
                params![stock_ticker_id, date],
                |row| row.get(0),
            )
            .optional()?;
        Ok(row.is_some())
    }

    /// Whether every known ticker has a price row for the date
    pub fn has_prices_for_all(&self, date: RunDate) -> Result<bool> {
        let ticker_count: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM stock_ticker", [], |row| row.get(0))?;
        if ticker_count == 0 {
            return Ok(false);
        }
        let priced: i64 = self.conn().query_row(
            "SELECT COUNT(DISTINCT stock_ticker_id) FROM daily_prices WHERE date = ?1",
            params![date],
            |row| row.get(0),
        )?;
        Ok(priced == ticker_count)
    }

    /// Top `n` ticker ids by market cap on `date`, largest first.
    ///
    /// Ties break on ascending ticker id so the ranking is reproducible.
    /// Fewer than `n` rows simply returns what is available.
    pub fn top_by_market_cap(&self, date: RunDate, n: u32) -> Result<Vec<TickerId>> {
        let mut stmt = self.conn().prepare(
            "SELECT stock_ticker_id FROM daily_prices
             WHERE date = ?1
             ORDER BY market_cap DESC, stock_ticker_id ASC
             LIMIT ?2",
        )?;
        let ids = stmt
            .query_map(params![date, n], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Close prices of the top `n` tickers by market cap on `date`
    pub fn close_prices_of_top(&self, date: RunDate, n: u32) -> Result<Vec<Price>> {
        let mut stmt = self.conn().prepare(
            "SELECT close_price FROM daily_prices
             WHERE date = ?1
             ORDER BY market_cap DESC, stock_ticker_id ASC
             LIMIT ?2",
        )?;
        let prices = stmt
            .query_map(params![date, n], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(prices)
    }
}
