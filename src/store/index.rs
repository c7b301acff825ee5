//! Stock index configuration, constituents and performance rows

use super::Store;
use crate::error::Result;
use crate::performance::CalculationKind;
use crate::strategy::StrategyKind;
use crate::types::{IndexId, Price, RunDate, TickerId};
use rusqlite::{params, OptionalExtension, Row};
use std::collections::HashSet;

/// Configuration of one stock index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockIndex {
    pub id: IndexId,
    pub name: String,
    pub strategy: StrategyKind,
    pub performance_calculation: CalculationKind,
    /// Selection breadth: how many tickers the index holds per day
    pub ticker_count: u32,
}

fn index_from_row(row: &Row<'_>) -> rusqlite::Result<StockIndex> {
    let strategy: String = row.get(2)?;
    let calculation: String = row.get(3)?;
    Ok(StockIndex {
        id: row.get(0)?,
        name: row.get(1)?,
        strategy: StrategyKind::parse(&strategy).map_err(|_| {
            rusqlite::Error::InvalidColumnType(2, "strategy".into(), rusqlite::types::Type::Text)
        })?,
        performance_calculation: CalculationKind::parse(&calculation).map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                3,
                "performance_calculation".into(),
                rusqlite::types::Type::Text,
            )
        })?,
        ticker_count: row.get(4)?,
    })
}

impl Store {
    /// Create a stock index, or return the existing one with that name
    pub fn create_stock_index(
        &mut self,
        name: &str,
        strategy: StrategyKind,
        performance_calculation: CalculationKind,
        ticker_count: u32,
    ) -> Result<StockIndex> {
        if let Some(existing) = self.stock_index_by_name(name)? {
            return Ok(existing);
        }

        self.conn().execute(
            "INSERT INTO stock_index (name, strategy, performance_calculation, ticker_count)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                name,
                strategy.as_str(),
                performance_calculation.as_str(),
                ticker_count
            ],
        )?;

        Ok(StockIndex {
            id: self.conn().last_insert_rowid(),
            name: name.to_string(),
            strategy,
            performance_calculation,
            ticker_count,
        })
    }

    /// Look up an index configuration by its unique name
    pub fn stock_index_by_name(&self, name: &str) -> Result<Option<StockIndex>> {
        let result = self
            .conn()
            .query_row(
                "SELECT id, name, strategy, performance_calculation, ticker_count
                 FROM stock_index WHERE name = ?1",
                params![name],
                index_from_row,
            )
            .optional()?;
        Ok(result)
    }

    /// Persist one constituent row per selected ticker for the date
    pub fn insert_constituents(
        &mut self,
        stock_index_id: IndexId,
        date: RunDate,
        ticker_ids: &[TickerId],
    ) -> Result<()> {
        let mut stmt = self.conn().prepare(
            "INSERT INTO index_constituent (stock_index_id, date, stock_ticker_id)
             VALUES (?1, ?2, ?3)",
        )?;
        for ticker_id in ticker_ids {
            stmt.execute(params![stock_index_id, date, ticker_id])?;
        }
        Ok(())
    }

    /// Persist the performance value for the date
    pub fn insert_performance(
        &mut self,
        stock_index_id: IndexId,
        date: RunDate,
        value: Price,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO index_performance (stock_index_id, date, value) VALUES (?1, ?2, ?3)",
            params![stock_index_id, date, value],
        )?;
        Ok(())
    }

    /// Whether both constituents and a performance value exist for (index, date)
    pub fn has_index_rows(&self, stock_index_id: IndexId, date: RunDate) -> Result<bool> {
        Ok(self.constituent_count(stock_index_id, date)? > 0
            && self.performance_count(stock_index_id, date)? > 0)
    }

    pub fn constituent_count(&self, stock_index_id: IndexId, date: RunDate) -> Result<usize> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM index_constituent WHERE stock_index_id = ?1 AND date = ?2",
            params![stock_index_id, date],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn performance_count(&self, stock_index_id: IndexId, date: RunDate) -> Result<usize> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM index_performance WHERE stock_index_id = ?1 AND date = ?2",
            params![stock_index_id, date],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Performance values in [start, end], ascending by date
    pub fn performance_range(
        &self,
        stock_index_id: IndexId,
        start: RunDate,
        end: RunDate,
    ) -> Result<Vec<(RunDate, Price)>> {
        let mut stmt = self.conn().prepare(
            "SELECT date, value FROM index_performance
             WHERE stock_index_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC",
        )?;
        let values = stmt
            .query_map(params![stock_index_id, start, end], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(values)
    }

    /// Constituent ticker ids for one day, in selection order
    pub fn constituents_for(&self, stock_index_id: IndexId, date: RunDate) -> Result<Vec<TickerId>> {
        let mut stmt = self.conn().prepare(
            "SELECT stock_ticker_id FROM index_constituent
             WHERE stock_index_id = ?1 AND date = ?2
             ORDER BY id",
        )?;
        let ids = stmt
            .query_map(params![stock_index_id, date], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Constituent sets per recorded day in [start, end], ascending by date
    pub fn constituent_days(
        &self,
        stock_index_id: IndexId,
        start: RunDate,
        end: RunDate,
    ) -> Result<Vec<(RunDate, HashSet<TickerId>)>> {
        let mut stmt = self.conn().prepare(
            "SELECT date, stock_ticker_id FROM index_constituent
             WHERE stock_index_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date ASC",
        )?;
        let rows = stmt
            .query_map(params![stock_index_id, start, end], |row| {
                Ok((row.get::<_, RunDate>(0)?, row.get::<_, TickerId>(1)?))
            })?
            .collect::<std::result::Result<Vec<(RunDate, TickerId)>, _>>()?;

        let mut days: Vec<(RunDate, HashSet<TickerId>)> = Vec::new();
        for (date, ticker_id) in rows {
            match days.last_mut() {
                Some((last_date, set)) if *last_date == date => {
                    set.insert(ticker_id);
                }
                _ => {
                    let mut set = HashSet::new();
                    set.insert(ticker_id);
                    days.push((date, set));
                }
            }
        }
        Ok(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn mcap_index(store: &mut Store) -> StockIndex {
        store
            .create_stock_index(
                "mcap_100",
                StrategyKind::MarketCap,
                CalculationKind::EqualWeighted,
                5,
            )
            .unwrap()
    }

    #[test]
    fn test_create_index_idempotent() {
        let mut store = Store::open_in_memory().unwrap();
        let first = mcap_index(&mut store);
        let second = mcap_index(&mut store);

        assert_eq!(first.id, second.id);
        assert_eq!(first, second);
    }

    #[test]
    fn test_index_lookup_miss() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.stock_index_by_name("nope").unwrap().is_none());
    }

    #[test]
    fn test_constituents_and_performance() {
        let mut store = Store::open_in_memory().unwrap();
        let index = mcap_index(&mut store);
        let d = date(2024, 1, 2);

        assert!(!store.has_index_rows(index.id, d).unwrap());

        store.insert_constituents(index.id, d, &[1, 2, 3]).unwrap();
        assert!(!store.has_index_rows(index.id, d).unwrap());

        store.insert_performance(index.id, d, 20.0).unwrap();
        assert!(store.has_index_rows(index.id, d).unwrap());

        assert_eq!(store.constituents_for(index.id, d).unwrap(), vec![1, 2, 3]);
        assert_eq!(store.constituent_count(index.id, d).unwrap(), 3);
        assert_eq!(store.performance_count(index.id, d).unwrap(), 1);
    }

    #[test]
    fn test_performance_range_ordering() {
        let mut store = Store::open_in_memory().unwrap();
        let index = mcap_index(&mut store);

        store.insert_performance(index.id, date(2024, 1, 3), 110.0).unwrap();
        store.insert_performance(index.id, date(2024, 1, 2), 100.0).unwrap();
        store.insert_performance(index.id, date(2024, 1, 5), 120.0).unwrap();

        let range = store
            .performance_range(index.id, date(2024, 1, 2), date(2024, 1, 4))
            .unwrap();
        assert_eq!(
            range,
            vec![(date(2024, 1, 2), 100.0), (date(2024, 1, 3), 110.0)]
        );
    }

    #[test]
    fn test_constituent_days_grouping() {
        let mut store = Store::open_in_memory().unwrap();
        let index = mcap_index(&mut store);

        store.insert_constituents(index.id, date(2024, 1, 2), &[1, 2]).unwrap();
        store.insert_constituents(index.id, date(2024, 1, 3), &[2, 3]).unwrap();

        let days = store
            .constituent_days(index.id, date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].0, date(2024, 1, 2));
        assert!(days[0].1.contains(&1) && days[0].1.contains(&2));
        assert_eq!(days[1].0, date(2024, 1, 3));
        assert!(days[1].1.contains(&3));
    }
}
