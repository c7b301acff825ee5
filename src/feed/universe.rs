//! Ticker universe sources
//!
//! The universe is the set of tickers the index may draw from. The standing
//! TICKER_REFRESH task upserts any missing universe entries into the store.

use crate::error::Result;
use crate::store::Store;
use crate::types::TickerInfo;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Trait for ticker universe sources
pub trait TickerUniverse: Send + Sync {
    /// All tickers the index may select from
    fn tickers(&self) -> Result<Vec<TickerInfo>>;
}

/// Ensure every universe ticker exists in the store; returns how many were new
pub fn refresh_tickers(store: &mut Store, universe: &dyn TickerUniverse) -> Result<usize> {
    let known: Vec<String> = store
        .all_tickers()?
        .into_iter()
        .map(|t| t.ticker)
        .collect();

    let mut created = 0;
    for info in universe.tickers()? {
        if !known.contains(&info.symbol) {
            store.upsert_ticker(&info.symbol, &info.name, &info.exchange)?;
            created += 1;
        }
    }
    if created > 0 {
        log::info!("Added {} new tickers to the universe", created);
    }
    Ok(created)
}

#[derive(Debug, Deserialize)]
struct UniverseRow {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Shortname")]
    name: String,
}

/// Ticker universe read from a CSV file with Symbol/Shortname columns
pub struct CsvUniverse {
    path: PathBuf,
    exchange: String,
}

impl CsvUniverse {
    pub fn new(path: &Path, exchange: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            exchange: exchange.to_string(),
        }
    }
}

impl TickerUniverse for CsvUniverse {
    fn tickers(&self) -> Result<Vec<TickerInfo>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .map_err(|e| crate::error::CapweightError::DataError(format!(
                "Failed to open universe file {}: {}",
                self.path.display(),
                e
            )))?;

        let mut tickers = Vec::new();
        for row in reader.deserialize() {
            let row: UniverseRow = row.map_err(|e| {
                crate::error::CapweightError::ParseError(format!("Bad universe row: {}", e))
            })?;
            tickers.push(TickerInfo {
                symbol: row.symbol,
                name: row.name,
                exchange: self.exchange.clone(),
            });
        }
        Ok(tickers)
    }
}

/// Fixed in-memory universe (for testing)
pub struct StaticUniverse {
    tickers: Vec<TickerInfo>,
}

impl StaticUniverse {
    pub fn new(tickers: Vec<TickerInfo>) -> Self {
        Self { tickers }
    }

    /// Universe of NASDAQ tickers from (symbol, name) pairs
    pub fn of_pairs(pairs: &[(&str, &str)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(symbol, name)| TickerInfo {
                    symbol: symbol.to_string(),
                    name: name.to_string(),
                    exchange: "NASDAQ".to_string(),
                })
                .collect(),
        )
    }
}

impl TickerUniverse for StaticUniverse {
    fn tickers(&self) -> Result<Vec<TickerInfo>> {
        Ok(self.tickers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_refresh_tickers_idempotent() {
        let mut store = Store::open_in_memory().unwrap();
        let universe = StaticUniverse::of_pairs(&[("AAPL", "Apple Inc."), ("MSFT", "Microsoft")]);

        assert_eq!(refresh_tickers(&mut store, &universe).unwrap(), 2);
        assert_eq!(refresh_tickers(&mut store, &universe).unwrap(), 0);
        assert_eq!(store.all_tickers().unwrap().len(), 2);
    }

    #[test]
    fn test_csv_universe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("universe.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Symbol,Shortname").unwrap();
        writeln!(file, "AAPL,Apple Inc.").unwrap();
        writeln!(file, "MSFT,Microsoft Corporation").unwrap();
        drop(file);

        let universe = CsvUniverse::new(&path, "NASDAQ");
        let tickers = universe.tickers().unwrap();
        assert_eq!(tickers.len(), 2);
        assert_eq!(tickers[0].symbol, "AAPL");
        assert_eq!(tickers[1].name, "Microsoft Corporation");
        assert_eq!(tickers[0].exchange, "NASDAQ");
    }

    #[test]
    fn test_csv_universe_missing_file() {
        let universe = CsvUniverse::new(Path::new("/nonexistent/universe.csv"), "NASDAQ");
        assert!(universe.tickers().is_err());
    }
}
