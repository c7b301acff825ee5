//! End-to-end pipeline tests: seed → drain → inspect

use approx::assert_relative_eq;
use capweight::analytics::summary_metrics;
use capweight::builder::{self, BuildOutcome};
use capweight::dispatcher::TaskContext;
use capweight::feed::universe::StaticUniverse;
use capweight::feed::InMemoryPriceFeed;
use capweight::performance::CalculationKind;
use capweight::scheduler::Scheduler;
use capweight::seeder::{seed_daily_chain, seed_window, ChainSpec};
use capweight::store::Store;
use capweight::strategy::StrategyKind;
use capweight::task::{TaskStatus, TaskType};
use capweight::types::DailyQuote;
use chrono::{Duration, NaiveDate};

const INDEX: &str = "mcap_100";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ctx() -> TaskContext {
    TaskContext {
        index_name: INDEX.to_string(),
        lookback_days: 30,
    }
}

fn window(start: NaiveDate, days: i64) -> ChainSpec {
    ChainSpec {
        index_name: INDEX.to_string(),
        ticker_count: 2,
        run_date: start,
        build_through: start + Duration::days(days),
    }
}

/// Feed and universe with three tickers quoted on every day of the window
fn market_fixture(start: NaiveDate, days: i64) -> (InMemoryPriceFeed, StaticUniverse) {
    let mut feed = InMemoryPriceFeed::new();
    for i in 0..days {
        let d = start + Duration::days(i);
        let drift = i as f64;
        feed.add_quote("AAA", DailyQuote::new(d, 10.0 + drift, 100.0));
        feed.add_quote("BBB", DailyQuote::new(d, 20.0 + drift, 90.0));
        feed.add_quote("CCC", DailyQuote::new(d, 30.0 + drift, 80.0));
    }
    let universe =
        StaticUniverse::of_pairs(&[("AAA", "A Corp"), ("BBB", "B Corp"), ("CCC", "C Corp")]);
    (feed, universe)
}

#[test]
fn test_full_pipeline_single_drain() {
    let mut store = Store::open_in_memory().unwrap();
    let start = date(2024, 1, 1);
    seed_window(&mut store, &window(start, 3)).unwrap();

    let (feed, universe) = market_fixture(start - Duration::days(30), 40);
    let scheduler = Scheduler::new(ctx(), &feed, &universe);
    let report = scheduler.run_once(&mut store).unwrap();

    // Three days, each with refresh + fetch + build, all in one drain
    assert_eq!(report.completed, 9);
    assert_eq!(report.failed, 0);
    assert_eq!(report.deferred, 0);

    for task in store.list_tasks(None).unwrap() {
        assert_eq!(task.status, TaskStatus::Completed);
    }

    let index = store.stock_index_by_name(INDEX).unwrap().unwrap();
    for i in 0..3 {
        let d = start + Duration::days(i);
        assert_eq!(store.constituent_count(index.id, d).unwrap(), 2);
        assert_eq!(store.performance_count(index.id, d).unwrap(), 1);
    }

    // Equal-weighted mean of the two largest caps' closes drifts by 1.0/day
    let values = store
        .performance_range(index.id, start, date(2024, 1, 3))
        .unwrap();
    assert_eq!(values.len(), 3);
    assert_relative_eq!(values[1].1 - values[0].1, 1.0);
    assert_relative_eq!(values[2].1 - values[1].1, 1.0);
}

#[test]
fn test_second_drain_is_a_no_op() {
    let mut store = Store::open_in_memory().unwrap();
    let start = date(2024, 1, 1);
    let spec = window(start, 2);
    seed_window(&mut store, &spec).unwrap();

    let (feed, universe) = market_fixture(start - Duration::days(30), 40);
    let scheduler = Scheduler::new(ctx(), &feed, &universe);
    scheduler.run_once(&mut store).unwrap();
    let second = scheduler.run_once(&mut store).unwrap();

    assert_eq!(second, capweight::scheduler::DrainReport::default());

    // Re-seeding and re-draining must not duplicate index rows either
    seed_window(&mut store, &spec).unwrap();
    scheduler.run_once(&mut store).unwrap();
    let index = store.stock_index_by_name(INDEX).unwrap().unwrap();
    assert_eq!(store.constituent_count(index.id, start).unwrap(), 2);
    assert_eq!(store.performance_count(index.id, start).unwrap(), 1);
}

#[test]
fn test_unreliable_feed_degrades_gracefully() {
    let mut store = Store::open_in_memory().unwrap();
    let start = date(2024, 1, 1);
    seed_daily_chain(&mut store, INDEX, 3, start).unwrap();

    let (mut feed, universe) = market_fixture(start - Duration::days(30), 40);
    feed.fail_ticker("CCC");

    let scheduler = Scheduler::new(ctx(), &feed, &universe);
    let report = scheduler.run_once(&mut store).unwrap();

    // The fetch task itself succeeds; the bad ticker is simply absent
    assert_eq!(report.failed, 0);
    assert_eq!(report.completed, 3);
    let index = store.stock_index_by_name(INDEX).unwrap().unwrap();
    assert_eq!(store.constituent_count(index.id, start).unwrap(), 2);
}

#[test]
fn test_build_without_any_market_data() {
    let mut store = Store::open_in_memory().unwrap();
    let start = date(2024, 1, 1);
    seed_daily_chain(&mut store, INDEX, 2, start).unwrap();

    // Empty feed: tickers exist but no quotes; the build finds no data
    let feed = InMemoryPriceFeed::new();
    let universe = StaticUniverse::of_pairs(&[("AAA", "A Corp")]);
    let scheduler = Scheduler::new(ctx(), &feed, &universe);
    let report = scheduler.run_once(&mut store).unwrap();

    // Transient data gaps are absorbed, not failures
    assert_eq!(report.failed, 0);
    assert_eq!(report.completed, 3);
    let index = store.stock_index_by_name(INDEX).unwrap().unwrap();
    assert_eq!(store.performance_count(index.id, start).unwrap(), 0);

    // Once data shows up, a direct rebuild fills the day in
    let a = store.upsert_ticker("AAA", "A Corp", "NASDAQ").unwrap();
    store.insert_daily_price(a, start, 10.0, 100.0).unwrap();
    let outcome = builder::build(&mut store, INDEX, start).unwrap();
    assert!(matches!(outcome, BuildOutcome::Built { .. }));
}

#[test]
fn test_dependency_ordering_across_drains() {
    let mut store = Store::open_in_memory().unwrap();
    store
        .create_stock_index(
            INDEX,
            StrategyKind::MarketCap,
            CalculationKind::EqualWeighted,
            2,
        )
        .unwrap();
    let d = date(2024, 1, 1);

    // A fetch task whose refresh dependency keeps failing: the fetch must
    // never run until the refresh completes.
    let bad_universe = capweight::feed::universe::CsvUniverse::new(
        std::path::Path::new("/nonexistent/universe.csv"),
        "NASDAQ",
    );
    let feed = InMemoryPriceFeed::new();
    let t1 = store.insert_task(TaskType::TickerRefresh, d, None).unwrap();
    let t2 = store.insert_task(TaskType::PriceFetch, d, Some(t1.id)).unwrap();

    let scheduler = Scheduler::new(ctx(), &feed, &bad_universe);
    let report = scheduler.run_once(&mut store).unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.deferred, 1);
    assert_eq!(store.task(t1.id).unwrap().unwrap().status, TaskStatus::Failed);
    assert_eq!(store.task(t2.id).unwrap().unwrap().status, TaskStatus::Initiated);

    // With a working universe the next drain completes the whole chain
    let universe = StaticUniverse::of_pairs(&[("AAA", "A Corp")]);
    let scheduler = Scheduler::new(ctx(), &feed, &universe);
    let report = scheduler.run_once(&mut store).unwrap();
    assert_eq!(report.completed, 2);
    assert_eq!(store.task(t2.id).unwrap().unwrap().status, TaskStatus::Completed);
}

#[test]
fn test_summary_metrics_over_built_range() {
    let mut store = Store::open_in_memory().unwrap();
    let start = date(2024, 1, 1);
    seed_window(&mut store, &window(start, 3)).unwrap();

    let (feed, universe) = market_fixture(start - Duration::days(30), 40);
    let scheduler = Scheduler::new(ctx(), &feed, &universe);
    scheduler.run_once(&mut store).unwrap();

    let metrics = summary_metrics(&store, INDEX, start, date(2024, 1, 3)).unwrap();
    // Caps never change, so only the first day introduces constituents
    assert_eq!(metrics.composition_changes, vec![2, 0, 0]);
    assert_eq!(metrics.daily_changes.len(), 2);
    assert_relative_eq!(metrics.daily_changes[0], 1.0);
    assert!(metrics.cumulative_return > 0.0);
}
