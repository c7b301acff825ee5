//! Index performance calculation
//!
//! A calculator reduces the day's candidate set to one composite value.
//! Missing market data is surfaced as [`Valuation::InsufficientData`]
//! rather than a silent 0.0, so callers can decide whether to persist.

use crate::error::{CapweightError, Result};
use crate::store::Store;
use crate::types::{Price, RunDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which calculation rule an index is configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalculationKind {
    EqualWeighted,
}

impl CalculationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationKind::EqualWeighted => "EQUAL_WEIGHTED",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "EQUAL_WEIGHTED" => Ok(CalculationKind::EqualWeighted),
            other => Err(CapweightError::ConfigError(format!(
                "Unsupported performance calculation: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for CalculationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a performance calculation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Valuation {
    /// A composite value was computed from real market data
    Computed(Price),
    /// No market data for the date; nothing meaningful to report
    InsufficientData,
}

impl Valuation {
    /// Legacy numeric view: 0.0 when there was nothing to compute
    pub fn value_or_zero(&self) -> Price {
        match self {
            Valuation::Computed(value) => *value,
            Valuation::InsufficientData => 0.0,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Valuation::Computed(_))
    }
}

/// Trait for composite performance calculators
pub trait PerformanceCalculator: Send + Sync {
    /// Compute the composite value over the day's top `top_n` candidates
    fn compute(&self, store: &Store, date: RunDate, top_n: u32) -> Result<Valuation>;

    /// Get calculator name
    fn name(&self) -> &str;
}

/// Arithmetic mean of the top-N-by-market-cap close prices
pub struct EqualWeightedCalculator;

impl PerformanceCalculator for EqualWeightedCalculator {
    fn compute(&self, store: &Store, date: RunDate, top_n: u32) -> Result<Valuation> {
        let closes = store.close_prices_of_top(date, top_n)?;
        if closes.is_empty() {
            return Ok(Valuation::InsufficientData);
        }
        let mean = closes.iter().sum::<Price>() / closes.len() as f64;
        Ok(Valuation::Computed(mean))
    }

    fn name(&self) -> &str {
        "EqualWeighted"
    }
}

/// Get the calculator implementation for a configured kind
pub fn calculator_for(kind: CalculationKind) -> Box<dyn PerformanceCalculator> {
    match kind {
        CalculationKind::EqualWeighted => Box::new(EqualWeightedCalculator),
    }
}
