//! Task dispatch
//!
//! Maps a persisted task to a strongly-typed payload and runs the matching
//! executor. Both matches are exhaustive over closed enums, so a task type
//! without an executor is unrepresentable.

use crate::builder;
use crate::error::Result;
use crate::feed::{refresh_prices, PriceFeed, TickerUniverse};
use crate::feed::universe::refresh_tickers;
use crate::store::Store;
use crate::task::{Task, TaskType};
use crate::types::RunDate;

/// Explicit per-run context, threaded from configuration at the edge
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Name of the index the standing task chain maintains
    pub index_name: String,
    /// How many days of history a price fetch backfills
    pub lookback_days: i64,
}

/// A task's declared type resolved to its executor parameters
#[derive(Debug, Clone, PartialEq)]
pub enum TaskPayload {
    TickerRefresh,
    PriceFetch {
        target_date: RunDate,
        lookback_days: i64,
    },
    IndexBuild {
        index_name: String,
        target_date: RunDate,
    },
}

impl TaskPayload {
    /// Build the payload for a task from its row and the run context
    pub fn for_task(task: &Task, ctx: &TaskContext) -> Self {
        match task.task_type {
            TaskType::TickerRefresh => TaskPayload::TickerRefresh,
            TaskType::PriceFetch => TaskPayload::PriceFetch {
                target_date: task.run_date,
                lookback_days: ctx.lookback_days,
            },
            TaskType::IndexBuild => TaskPayload::IndexBuild {
                index_name: ctx.index_name.clone(),
                target_date: task.run_date,
            },
        }
    }
}

/// Execute one payload against the store.
///
/// The executor's result or error is returned unchanged to the scheduler.
pub fn dispatch(
    store: &mut Store,
    feed: &dyn PriceFeed,
    universe: &dyn TickerUniverse,
    payload: &TaskPayload,
) -> Result<()> {
    match payload {
        TaskPayload::TickerRefresh => {
            refresh_tickers(store, universe)?;
        }
        TaskPayload::PriceFetch {
            target_date,
            lookback_days,
        } => {
            refresh_prices(store, feed, *target_date, *lookback_days)?;
        }
        TaskPayload::IndexBuild {
            index_name,
            target_date,
        } => {
            builder::build(store, index_name, *target_date)?;
        }
    }
    Ok(())
}
