//! Report Summary Module
//! Collects the cleaned-table statistics and ratio tables into one serializable summary.

use crate::config::Config;
use crate::data::{
    CleanedTable, CleaningSummary, DataProcessor, EfficiencyRatio, Estimator, GroupEstimate,
    NocRegion, NumericField,
};
use crate::stats::{AggregatorError, EfficiencyAggregator, FieldStats, LinearFit, StatsCalculator};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Aggregation failed: {0}")]
    Aggregation(#[from] AggregatorError),
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Partition estimates used to fill missing measurements.
#[derive(Debug, Clone, Serialize)]
pub struct ImputationEstimates {
    pub weight_median: Vec<GroupEstimate>,
    pub height_mean: Vec<GroupEstimate>,
}

/// Everything the presentation layer consumes from the cleaning pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub cleaning: CleaningSummary,
    pub fields: Vec<FieldStats>,
    pub estimates: ImputationEstimates,
    /// Total medals regressed on total participations across NOCs.
    pub medals_vs_participations: Option<LinearFit>,
    /// Weight regressed on height across cleaned rows.
    pub weight_vs_height: Option<LinearFit>,
    pub global_ratios: Vec<EfficiencyRatio>,
    pub yearly_ratios: Vec<EfficiencyRatio>,
}

impl AnalysisReport {
    pub fn build(
        cleaned: &CleanedTable,
        regions: &[NocRegion],
        config: &Config,
    ) -> Result<Self, ReportError> {
        let events = &cleaned.events;

        let mut global_ratios =
            EfficiencyAggregator::global_ratios(events, regions, config.join_policy)?;
        let mut yearly_ratios =
            EfficiencyAggregator::yearly_ratios(events, regions, config.join_policy)?;

        let (participations, medals): (Vec<f64>, Vec<f64>) = global_ratios
            .iter()
            .map(|r| (r.total_athletes as f64, r.total_medals as f64))
            .unzip();
        let medals_vs_participations = StatsCalculator::linear_regression(&participations, &medals);

        let (heights, weights): (Vec<f64>, Vec<f64>) = events
            .iter()
            .filter_map(|e| Some((e.height?, e.weight?)))
            .unzip();
        let weight_vs_height = StatsCalculator::linear_regression(&heights, &weights);

        if let Some(top) = config.top {
            global_ratios.truncate(top);
            yearly_ratios.truncate(top);
        }

        Ok(Self {
            cleaning: cleaned.summary.clone(),
            fields: StatsCalculator::summarize_fields(events),
            estimates: ImputationEstimates {
                weight_median: DataProcessor::group_estimates(
                    events,
                    NumericField::Weight,
                    Estimator::Median,
                ),
                height_mean: DataProcessor::group_estimates(
                    events,
                    NumericField::Height,
                    Estimator::Mean,
                ),
            },
            medals_vs_participations,
            weight_vs_height,
            global_ratios,
            yearly_ratios,
        })
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, ReportError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}
