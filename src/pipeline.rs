//! Pipeline Module
//! Runs load → clean → aggregate → report once over the two input tables.

use crate::config::Config;
use crate::data::{DataLoader, DataProcessor};
use crate::report::AnalysisReport;
use anyhow::{Context, Result};
use tracing::info;

/// Execute the full analysis described by `config`.
///
/// Any stage failure aborts the run; later stages need the complete output
/// of earlier ones.
pub fn run(config: &Config) -> Result<AnalysisReport> {
    let events = DataLoader::load_athlete_events(&config.athletes)
        .with_context(|| format!("loading {}", config.athletes.display()))?;
    let regions = DataLoader::load_noc_regions(&config.regions)
        .with_context(|| format!("loading {}", config.regions.display()))?;

    let cleaned =
        DataProcessor::clean(&events, config.imputation).context("cleaning athlete events")?;

    let report =
        AnalysisReport::build(&cleaned, &regions, config).context("building analysis report")?;

    info!(
        nocs = report.global_ratios.len(),
        noc_years = report.yearly_ratios.len(),
        "analysis complete"
    );
    Ok(report)
}
