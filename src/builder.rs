//! Index builder
//!
//! Orchestrates one (index, date) build: resolve the index configuration,
//! select constituents, compute the composite value, persist both. The
//! idempotency guard lives here, not in callers: a rebuild of an
//! already-built day is a no-op and can never duplicate rows.

use crate::error::{CapweightError, Result};
use crate::performance::calculator_for;
use crate::store::Store;
use crate::strategy::strategy_for;
use crate::types::{Price, RunDate};

/// What one build invocation did
#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome {
    /// Constituents and a performance value were persisted
    Built { constituents: usize, value: Price },
    /// (index, date) already had rows; nothing written
    AlreadyBuilt,
    /// No market data for the date; nothing written
    NoMarketData,
}

/// Build the named index for one date
pub fn build(store: &mut Store, index_name: &str, target_date: RunDate) -> Result<BuildOutcome> {
    let index = store
        .stock_index_by_name(index_name)?
        .ok_or_else(|| CapweightError::IndexNotFound(index_name.to_string()))?;

    if store.has_index_rows(index.id, target_date)? {
        log::debug!(
            "Index {} already built for {}, skipping",
            index.name,
            target_date
        );
        return Ok(BuildOutcome::AlreadyBuilt);
    }

    let strategy = strategy_for(index.strategy);
    let selected = strategy.select(store, target_date, index.ticker_count)?;

    let calculator = calculator_for(index.performance_calculation);
    let valuation = calculator.compute(store, target_date, index.ticker_count)?;

    if selected.is_empty() || !valuation.is_computed() {
        log::warn!(
            "No market data for {} on {}; index not built",
            index.name,
            target_date
        );
        return Ok(BuildOutcome::NoMarketData);
    }

    let value = valuation.value_or_zero();
    // A day is either fully built or untouched; a half-written day would
    // defeat the has_index_rows guard on the next attempt.
    store.atomically(|store| {
        store.insert_constituents(index.id, target_date, &selected)?;
        store.insert_performance(index.id, target_date, value)
    })?;

    log::info!(
        "Built index {} for {}: {} constituents, value {:.4}",
        index.name,
        target_date,
        selected.len(),
        value
    );

    Ok(BuildOutcome::Built {
        constituents: selected.len(),
        value,
    })
}
