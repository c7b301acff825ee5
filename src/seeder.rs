//! Standing task chain seeder
//!
//! Creates the daily chain TICKER_REFRESH → PRICE_FETCH → INDEX_BUILD for a
//! run date, idempotently: re-seeding an already-seeded date links to the
//! existing tasks instead of duplicating them. Chains are validated at seed
//! time so a cycle or dangling dependency never reaches the scheduler.

use crate::error::{CapweightError, Result};
use crate::performance::CalculationKind;
use crate::store::Store;
use crate::strategy::StrategyKind;
use crate::task::{Task, TaskType};
use crate::types::{RunDate, TaskId};
use chrono::Duration;
use hashbrown::HashSet;

/// A window of run dates to seed
#[derive(Debug, Clone)]
pub struct ChainSpec {
    pub index_name: String,
    /// Selection breadth for a freshly created index
    pub ticker_count: u32,
    /// First run date, inclusive
    pub run_date: RunDate,
    /// End of the window, exclusive
    pub build_through: RunDate,
}

impl ChainSpec {
    /// Standing window ending yesterday, reaching back `days` days
    pub fn trailing_window(index_name: &str, ticker_count: u32, today: RunDate, days: i64) -> Self {
        let build_through = today - Duration::days(1);
        Self {
            index_name: index_name.to_string(),
            ticker_count,
            run_date: build_through - Duration::days(days),
            build_through,
        }
    }
}

/// What one seeding pass created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub tasks_created: usize,
    pub tasks_existing: usize,
}

impl SeedReport {
    fn merge(&mut self, other: SeedReport) {
        self.tasks_created += other.tasks_created;
        self.tasks_existing += other.tasks_existing;
    }
}

/// Idempotently create the task chain for one run date.
///
/// Also creates the stock index itself (market-cap selection,
/// equal-weighted performance) if no index with that name exists yet.
pub fn seed_daily_chain(
    store: &mut Store,
    index_name: &str,
    ticker_count: u32,
    target_date: RunDate,
) -> Result<SeedReport> {
    store.create_stock_index(
        index_name,
        StrategyKind::MarketCap,
        CalculationKind::EqualWeighted,
        ticker_count,
    )?;

    let mut report = SeedReport::default();
    let existing = store.tasks_for_date(target_date)?;

    let refresh_id = find_or_create(store, &existing, TaskType::TickerRefresh, target_date, None, &mut report)?;
    let fetch_id = find_or_create(
        store,
        &existing,
        TaskType::PriceFetch,
        target_date,
        Some(refresh_id),
        &mut report,
    )?;
    let build_id = find_or_create(
        store,
        &existing,
        TaskType::IndexBuild,
        target_date,
        Some(fetch_id),
        &mut report,
    )?;

    validate_chain(store, build_id)?;
    Ok(report)
}

/// Seed the chain for every run date in the window
pub fn seed_window(store: &mut Store, spec: &ChainSpec) -> Result<SeedReport> {
    if spec.run_date >= spec.build_through {
        return Err(CapweightError::SeedError(format!(
            "Empty seed window: {} .. {}",
            spec.run_date, spec.build_through
        )));
    }

    let mut report = SeedReport::default();
    let mut day = spec.run_date;
    while day < spec.build_through {
        report.merge(seed_daily_chain(
            store,
            &spec.index_name,
            spec.ticker_count,
            day,
        )?);
        day += Duration::days(1);
    }

    log::info!(
        "Seeded {}: {} tasks created, {} existing",
        spec.index_name,
        report.tasks_created,
        report.tasks_existing
    );
    Ok(report)
}

fn find_or_create(
    store: &mut Store,
    existing: &[Task],
    task_type: TaskType,
    run_date: RunDate,
    depends_on: Option<TaskId>,
    report: &mut SeedReport,
) -> Result<TaskId> {
    if let Some(task) = existing.iter().find(|t| t.task_type == task_type) {
        report.tasks_existing += 1;
        return Ok(task.id);
    }
    let task = store.insert_task(task_type, run_date, depends_on)?;
    report.tasks_created += 1;
    Ok(task.id)
}

/// Walk depends_on links from `task_id` to the chain head.
///
/// Errors on a dangling reference or a cycle, neither of which a
/// well-formed linear chain can contain.
pub fn validate_chain(store: &Store, task_id: TaskId) -> Result<()> {
    let mut visited: HashSet<TaskId> = HashSet::new();
    let mut current = task_id;

    loop {
        if !visited.insert(current) {
            return Err(CapweightError::SeedError(format!(
                "Dependency cycle through task {}",
                current
            )));
        }
        let task = store.task(current)?.ok_or_else(|| {
            CapweightError::SeedError(format!("Dangling dependency: task {} not found", current))
        })?;
        match task.depends_on {
            Some(parent) => current = parent,
            None => return Ok(()),
        }
    }
}
