//! Run Configuration Module
//! Command-line options and the policy switches shared by the pipeline stages.

use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

/// What to do with a missing value whose `(year, sex)` partition has no
/// observations to estimate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputationPolicy {
    /// Leave the cell missing and keep the row.
    #[default]
    Propagate,
    /// Abort with an imputation error.
    Fail,
}

/// What to do with NOC codes that have no row in the region table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinPolicy {
    /// Drop them from the ratio tables.
    #[default]
    Silent,
    /// Abort with a join gap error listing them.
    Strict,
}

/// Olympic athlete-event cleaning and medal efficiency analysis
#[derive(Parser, Debug, Clone)]
#[command(name = "olympics-eda", version, about)]
pub struct Config {
    /// Path to athlete_events.csv
    #[arg(long, default_value = "data/athlete_events.csv")]
    pub athletes: PathBuf,

    /// Path to noc_regions.csv
    #[arg(long, default_value = "data/noc_regions.csv")]
    pub regions: PathBuf,

    /// Handling of empty imputation partitions
    #[arg(long, value_enum, default_value_t = ImputationPolicy::Propagate)]
    pub imputation: ImputationPolicy,

    /// Handling of NOC codes missing from the region table
    #[arg(long = "join", value_enum, default_value_t = JoinPolicy::Silent)]
    pub join_policy: JoinPolicy,

    /// Keep only the first N rows of each ratio table in the report
    #[arg(long)]
    pub top: Option<usize>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,

    /// Log filter directive (e.g. info, debug, olympics_eda=trace)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            athletes: PathBuf::from("data/athlete_events.csv"),
            regions: PathBuf::from("data/noc_regions.csv"),
            imputation: ImputationPolicy::default(),
            join_policy: JoinPolicy::default(),
            top: None,
            pretty: false,
            log_level: "info".to_string(),
        }
    }
}
