//! SQLite-backed transactional store
//!
//! Owns the single connection shared by the scheduler, seeder, builder and
//! read accessors. The four persisted entities (tasks, stock indexes with
//! their constituents and performance values, tickers, daily prices) are
//! split across submodules; all of them hang off [`Store`].

mod index;
mod market;
mod tasks;

pub use index::StockIndex;
pub use market::StockTicker;

use crate::error::Result;
use rusqlite::Connection;
use std::path::Path;

/// Store with SQLite backend
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Create or open database at path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let mut store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    /// Create in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn };
        store.create_tables()?;
        Ok(store)
    }

    /// Create database tables
    pub fn create_tables(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                task_type TEXT NOT NULL,
                status TEXT NOT NULL,
                run_date TEXT NOT NULL,
                depends_on INTEGER REFERENCES tasks(id),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
            CREATE INDEX IF NOT EXISTS idx_tasks_run_date ON tasks(run_date);

            CREATE TABLE IF NOT EXISTS stock_ticker (
                id INTEGER PRIMARY KEY,
                ticker TEXT NOT NULL,
                name TEXT NOT NULL,
                exchange TEXT NOT NULL,
                UNIQUE(ticker, exchange)
            );

            CREATE TABLE IF NOT EXISTS daily_prices (
                id INTEGER PRIMARY KEY,
                stock_ticker_id INTEGER NOT NULL REFERENCES stock_ticker(id),
                date TEXT NOT NULL,
                close_price REAL NOT NULL,
                market_cap REAL NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_daily_prices_date ON daily_prices(date);

            CREATE TABLE IF NOT EXISTS stock_index (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                strategy TEXT NOT NULL,
                performance_calculation TEXT NOT NULL,
                ticker_count INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS index_constituent (
                id INTEGER PRIMARY KEY,
                stock_index_id INTEGER NOT NULL REFERENCES stock_index(id),
                date TEXT NOT NULL,
                stock_ticker_id INTEGER NOT NULL REFERENCES stock_ticker(id)
            );
            CREATE INDEX IF NOT EXISTS idx_constituent_date
                ON index_constituent(stock_index_id, date);

            CREATE TABLE IF NOT EXISTS index_performance (
                id INTEGER PRIMARY KEY,
                stock_index_id INTEGER NOT NULL REFERENCES stock_index(id),
                date TEXT NOT NULL,
                value REAL NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_performance_date
                ON index_performance(stock_index_id, date);",
        )?;

        Ok(())
    }

    /// Begin a transaction covering one task's store operations
    pub fn begin(&mut self) -> Result<()> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    /// Commit the open transaction
    pub fn commit(&mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    /// Roll back the open transaction
    pub fn rollback(&mut self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    /// Apply `f` atomically: on error every write inside it is undone.
    ///
    /// Backed by a savepoint, so it nests inside an open task transaction
    /// and acts as its own transaction when none is open.
    pub(crate) fn atomically<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.conn.execute_batch("SAVEPOINT unit")?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("RELEASE unit")?;
                Ok(value)
            }
            Err(e) => {
                self.conn.execute_batch("ROLLBACK TO unit; RELEASE unit")?;
                Err(e)
            }
        }
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}
