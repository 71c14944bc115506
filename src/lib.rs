//! Olympics EDA - athlete-event cleaning & medal efficiency analysis
//!
//! Loads the `athlete_events.csv` / `noc_regions.csv` pair, removes duplicate
//! rows, imputes missing measurements per `(year, sex)` and computes
//! medal-per-participation ratios by NOC and by NOC × year.

pub mod config;
pub mod data;
pub mod pipeline;
pub mod report;
pub mod stats;

pub use config::{Config, ImputationPolicy, JoinPolicy};
pub use report::AnalysisReport;
