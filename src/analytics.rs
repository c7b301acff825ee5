//! Read-side analytics over persisted index data
//!
//! All derivations are pure functions over value sequences ordered by date;
//! [`summary_metrics`] is the store-backed convenience wrapper.

use crate::error::{CapweightError, Result};
use crate::store::Store;
use crate::types::{Price, RunDate, TickerId};
use serde::Serialize;
use std::collections::HashSet;

/// Cumulative return over a performance series in percent.
///
/// (end − start) / start × 100; 0.0 when the series is empty or starts at
/// zero (no division by zero).
pub fn cumulative_return(values: &[Price]) -> f64 {
    let (Some(start), Some(end)) = (values.first(), values.last()) else {
        return 0.0;
    };
    if *start == 0.0 {
        return 0.0;
    }
    (end - start) / start * 100.0
}

/// Successive differences between consecutive performance values.
///
/// The first entry has no predecessor and is skipped.
pub fn daily_changes(values: &[Price]) -> Vec<f64> {
    values.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

/// Mean of the daily changes, 0.0 when there are none
pub fn average_daily_change(values: &[Price]) -> f64 {
    let changes = daily_changes(values);
    if changes.is_empty() {
        return 0.0;
    }
    changes.iter().sum::<f64>() / changes.len() as f64
}

/// Tickers new on each recorded day compared to the previous calendar day.
///
/// A day whose previous calendar day has no recorded composition counts
/// every constituent as new: the first recorded day reports its full size,
/// and a gap in the range resets the baseline the same way.
pub fn composition_change_counts(
    days: &[(RunDate, HashSet<TickerId>)],
) -> Vec<(RunDate, usize)> {
    let mut out = Vec::with_capacity(days.len());
    let mut prev: Option<(RunDate, &HashSet<TickerId>)> = None;
    for (date, current) in days {
        let new_members = match prev {
            Some((prev_date, prev_set)) if prev_date.succ_opt() == Some(*date) => {
                current.difference(prev_set).count()
            }
            _ => current.len(),
        };
        out.push((*date, new_members));
        prev = Some((*date, current));
    }
    out
}

/// Per-day booleans: did the composition change relative to the previous day
pub fn composition_changed(days: &[(RunDate, HashSet<TickerId>)]) -> Vec<(RunDate, bool)> {
    composition_change_counts(days)
        .into_iter()
        .map(|(date, count)| (date, count > 0))
        .collect()
}

/// Aggregated read-side view over one date range
#[derive(Debug, Clone, Serialize)]
pub struct SummaryMetrics {
    pub cumulative_return: f64,
    pub average_daily_change: f64,
    pub daily_changes: Vec<f64>,
    pub composition_changes: Vec<usize>,
}

/// Compute summary metrics for a named index over [start, end]
pub fn summary_metrics(
    store: &Store,
    index_name: &str,
    start: RunDate,
    end: RunDate,
) -> Result<SummaryMetrics> {
    let index = store
        .stock_index_by_name(index_name)?
        .ok_or_else(|| CapweightError::IndexNotFound(index_name.to_string()))?;

    let values: Vec<Price> = store
        .performance_range(index.id, start, end)?
        .into_iter()
        .map(|(_, value)| value)
        .collect();

    let days = store.constituent_days(index.id, start, end)?;

    Ok(SummaryMetrics {
        cumulative_return: cumulative_return(&values),
        average_daily_change: average_daily_change(&values),
        daily_changes: daily_changes(&values),
        composition_changes: composition_change_counts(&days)
            .into_iter()
            .map(|(_, count)| count)
            .collect(),
    })
}
