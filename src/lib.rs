//! # capweight
//!
//! Daily construction of a market-cap-weighted stock index, driven by a
//! dependency-ordered batch task pipeline that tolerates partial failure.
//!
//! A seeder writes the standing task chain (ticker refresh → price fetch →
//! index build) into the store; the scheduler drains runnable tasks in
//! dependency order, one at a time; the index builder selects the top-N
//! tickers by market cap and persists the constituents plus an
//! equal-weighted performance value.
//!
//! ## Example
//!
//! ```rust,no_run
//! use capweight::prelude::*;
//! use capweight::feed::InMemoryPriceFeed;
//! use capweight::feed::universe::StaticUniverse;
//! use chrono::NaiveDate;
//!
//! let settings = Settings::default();
//! let mut store = Store::open(&settings.db_path).unwrap();
//!
//! let spec = ChainSpec::trailing_window(
//!     &settings.index_name,
//!     settings.ticker_count,
//!     NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
//!     settings.lookback_days,
//! );
//! seed_window(&mut store, &spec).unwrap();
//!
//! let feed = InMemoryPriceFeed::new();
//! let universe = StaticUniverse::of_pairs(&[("AAPL", "Apple Inc.")]);
//! let scheduler = Scheduler::new(settings.task_context(), &feed, &universe);
//! let report = scheduler.run_once(&mut store).unwrap();
//! println!("completed {} tasks", report.completed);
//! ```

pub mod analytics;
pub mod builder;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod feed;
pub mod performance;
pub mod scheduler;
pub mod seeder;
pub mod store;
pub mod strategy;
pub mod task;
pub mod types;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::analytics::{summary_metrics, SummaryMetrics};
    pub use crate::builder::{build, BuildOutcome};
    pub use crate::config::Settings;
    pub use crate::dispatcher::{TaskContext, TaskPayload};
    pub use crate::error::{CapweightError, Result};
    pub use crate::feed::{PriceFeed, TickerUniverse};
    pub use crate::performance::{CalculationKind, Valuation};
    pub use crate::scheduler::{DrainReport, Scheduler};
    pub use crate::seeder::{seed_daily_chain, seed_window, ChainSpec};
    pub use crate::store::{StockIndex, Store};
    pub use crate::strategy::StrategyKind;
    pub use crate::task::{Task, TaskStatus, TaskType};
    pub use crate::types::*;
}
