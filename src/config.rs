//! Runtime configuration
//!
//! Settings are resolved once at the process edge and turned into the
//! explicit [`TaskContext`](crate::dispatcher::TaskContext) threaded through
//! every call; nothing reads ambient configuration mid-pipeline.

use crate::dispatcher::TaskContext;
use std::env;
use std::path::PathBuf;

/// Process settings with environment overrides (CAPWEIGHT_* variables)
#[derive(Debug, Clone)]
pub struct Settings {
    /// SQLite database path
    pub db_path: PathBuf,
    /// Name of the standing index
    pub index_name: String,
    /// Selection breadth N
    pub ticker_count: u32,
    /// How far back price fetches and seeding windows reach
    pub lookback_days: i64,
    /// CSV file with the ticker universe (Symbol/Shortname columns)
    pub universe_csv: PathBuf,
    /// Exchange label for universe tickers
    pub exchange: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("capweight.db"),
            index_name: "mcap_100".to_string(),
            ticker_count: 5,
            lookback_days: 30,
            universe_csv: PathBuf::from("universe.csv"),
            exchange: "NASDAQ".to_string(),
        }
    }
}

impl Settings {
    /// Defaults overridden by CAPWEIGHT_* environment variables
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(path) = env::var("CAPWEIGHT_DB_PATH") {
            settings.db_path = PathBuf::from(path);
        }
        if let Ok(name) = env::var("CAPWEIGHT_INDEX_NAME") {
            settings.index_name = name;
        }
        if let Ok(count) = env::var("CAPWEIGHT_TICKER_COUNT") {
            if let Ok(count) = count.parse() {
                settings.ticker_count = count;
            }
        }
        if let Ok(days) = env::var("CAPWEIGHT_LOOKBACK_DAYS") {
            if let Ok(days) = days.parse() {
                settings.lookback_days = days;
            }
        }
        if let Ok(path) = env::var("CAPWEIGHT_UNIVERSE_CSV") {
            settings.universe_csv = PathBuf::from(path);
        }
        if let Ok(exchange) = env::var("CAPWEIGHT_EXCHANGE") {
            settings.exchange = exchange;
        }
        settings
    }

    /// The explicit per-run context handed to the scheduler
    pub fn task_context(&self) -> TaskContext {
        TaskContext {
            index_name: self.index_name.clone(),
            lookback_days: self.lookback_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.index_name, "mcap_100");
        assert_eq!(settings.ticker_count, 5);
        assert_eq!(settings.lookback_days, 30);
    }

    #[test]
    fn test_task_context() {
        let settings = Settings::default();
        let ctx = settings.task_context();
        assert_eq!(ctx.index_name, "mcap_100");
        assert_eq!(ctx.lookback_days, 30);
    }
}
