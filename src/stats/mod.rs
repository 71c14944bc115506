//! Stats module - descriptive statistics, regressions and ratio aggregation

mod aggregator;
mod calculator;

pub use aggregator::{AggregatorError, EfficiencyAggregator};
pub use calculator::{FieldStats, LinearFit, StatsCalculator};
