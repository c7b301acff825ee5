//! capweight CLI - daily index pipeline operations
//!
//! ## Example Usage
//!
//! ```bash
//! # Create the database and seed the standing task chain
//! capweight seed --date 2024-02-01
//!
//! # Run one scheduler drain
//! capweight run
//!
//! # Inspect tasks and performance
//! capweight status --filter FAILED
//! capweight perf --start 2024-01-01 --end 2024-01-31
//! ```

use capweight::analytics::summary_metrics;
use capweight::config::Settings;
use capweight::error::CapweightError;
use capweight::feed::universe::CsvUniverse;
#[cfg(feature = "async")]
use capweight::feed::BlockingYahooFeed;
#[cfg(not(feature = "async"))]
use capweight::feed::InMemoryPriceFeed;
use capweight::scheduler::Scheduler;
use capweight::seeder::{seed_window, ChainSpec};
use capweight::store::Store;
use capweight::task::TaskStatus;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process;

/// capweight: market-cap-weighted index construction
#[derive(Parser)]
#[command(name = "capweight")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Market-cap-weighted index construction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and tables
    Init,

    /// Seed the standing daily task chain
    Seed {
        /// Anchor date (YYYY-MM-DD); defaults to today
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Execute one scheduler drain
    Run,

    /// List tasks
    Status {
        /// Only tasks in this status (INITIATED, IN_PROGRESS, FAILED, COMPLETED)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show performance values and summary metrics for a date range
    Perf {
        /// Start date (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(short, long)]
        end: String,

        /// Emit summary metrics as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("Invalid date '{}': {}", s, e))
}

fn status_colored(status: TaskStatus) -> colored::ColoredString {
    match status {
        TaskStatus::Completed => status.as_str().green(),
        TaskStatus::Failed => status.as_str().red(),
        TaskStatus::InProgress => status.as_str().yellow(),
        TaskStatus::Initiated => status.as_str().normal(),
    }
}

fn run(cli: Cli, settings: &Settings) -> anyhow::Result<()> {
    let mut store = Store::open(&settings.db_path)?;

    match cli.command {
        Commands::Init => {
            println!("Database ready at {}", settings.db_path.display());
        }

        Commands::Seed { date } => {
            let anchor = match date {
                Some(s) => parse_date(&s)?,
                None => Utc::now().date_naive(),
            };
            let spec = ChainSpec::trailing_window(
                &settings.index_name,
                settings.ticker_count,
                anchor,
                settings.lookback_days,
            );
            let report = seed_window(&mut store, &spec)?;
            println!(
                "Seeded {}: {} tasks created, {} already present",
                settings.index_name, report.tasks_created, report.tasks_existing
            );
        }

        Commands::Run => {
            let universe = CsvUniverse::new(&settings.universe_csv, &settings.exchange);
            #[cfg(feature = "async")]
            let feed = BlockingYahooFeed::new()?;
            // Offline build: price rows must already be in the store.
            #[cfg(not(feature = "async"))]
            let feed = InMemoryPriceFeed::new();
            let scheduler = Scheduler::new(settings.task_context(), &feed, &universe);
            let report = scheduler.run_once(&mut store)?;
            println!(
                "{} completed, {} failed, {} deferred",
                report.completed.to_string().green(),
                report.failed.to_string().red(),
                report.deferred
            );
        }

        Commands::Status { filter } => {
            let status = match filter {
                Some(s) => Some(
                    TaskStatus::parse(&s)
                        .map_err(|_| CapweightError::ConfigError(format!("Bad status: {}", s)))?,
                ),
                None => None,
            };
            for task in store.list_tasks(status)? {
                println!(
                    "{:>5}  {:<15} {:<12} {}  deps: {}",
                    task.id,
                    task.task_type.as_str(),
                    status_colored(task.status),
                    task.run_date,
                    task.depends_on
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
        }

        Commands::Perf { start, end, json } => {
            let start = parse_date(&start)?;
            let end = parse_date(&end)?;
            let index = store
                .stock_index_by_name(&settings.index_name)?
                .ok_or_else(|| CapweightError::IndexNotFound(settings.index_name.clone()))?;

            let metrics = summary_metrics(&store, &settings.index_name, start, end)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&metrics)?);
                return Ok(());
            }

            for (date, value) in store.performance_range(index.id, start, end)? {
                println!("{}  {:.4}", date, value);
            }

            println!();
            println!("cumulative return:    {:.2}%", metrics.cumulative_return);
            println!("avg daily change:     {:.4}", metrics.average_daily_change);
            println!(
                "composition changes:  {:?}",
                metrics.composition_changes
            );
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let settings = Settings::from_env();

    if let Err(e) = run(cli, &settings) {
        eprintln!("{} {}", "error:".red().bold(), e);
        process::exit(1);
    }
}
