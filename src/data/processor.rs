//! Data Processor Module
//! Handles data cleaning: deduplication, medal substitution and grouped imputation.

use super::model::{AthleteEvent, GroupEstimate, Medal, NumericField, Sex};
use crate::config::ImputationPolicy;
use crate::stats::StatsCalculator;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImputationError {
    #[error("No observed {field} values to impute from for year {year}, sex {sex}")]
    EmptyPartition {
        field: NumericField,
        year: i32,
        sex: Sex,
    },
}

/// Central-tendency statistic used for a partition estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Estimator {
    Median,
    Mean,
}

/// Counts describing what the cleaning pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningSummary {
    pub rows_loaded: usize,
    pub duplicates_removed: usize,
    pub medals_filled: usize,
    pub weights_imputed: usize,
    pub weights_missing: usize,
    pub heights_imputed: usize,
    pub heights_missing: usize,
}

/// Cleaned table plus the summary of the changes made to it.
#[derive(Debug, Clone)]
pub struct CleanedTable {
    pub events: Vec<AthleteEvent>,
    pub summary: CleaningSummary,
}

#[derive(Debug, Default)]
struct ImputeOutcome {
    imputed: usize,
    missing: usize,
}

/// Handles data cleaning operations. Every operation returns a new table.
pub struct DataProcessor;

impl DataProcessor {
    /// Collapse rows that are equal in every field, keeping the first
    /// occurrence in input order.
    pub fn deduplicate(events: &[AthleteEvent]) -> Vec<AthleteEvent> {
        let mut seen = HashSet::with_capacity(events.len());
        events
            .iter()
            .filter(|event| seen.insert(event.row_key()))
            .cloned()
            .collect()
    }

    /// Replace missing medals with `Medal::NoMedal`.
    pub fn fill_missing_medals(events: &[AthleteEvent]) -> Vec<AthleteEvent> {
        events
            .iter()
            .map(|event| AthleteEvent {
                medal: Some(event.medal.unwrap_or(Medal::NoMedal)),
                ..event.clone()
            })
            .collect()
    }

    /// Fill missing weights with the median weight of the row's `(year, sex)`.
    pub fn impute_weight(
        events: &[AthleteEvent],
        policy: ImputationPolicy,
    ) -> Result<Vec<AthleteEvent>, ImputationError> {
        Self::impute_field(events, NumericField::Weight, Estimator::Median, policy)
            .map(|(events, _)| events)
    }

    /// Fill missing heights with the mean height of the row's `(year, sex)`.
    pub fn impute_height(
        events: &[AthleteEvent],
        policy: ImputationPolicy,
    ) -> Result<Vec<AthleteEvent>, ImputationError> {
        Self::impute_field(events, NumericField::Height, Estimator::Mean, policy)
            .map(|(events, _)| events)
    }

    /// Per-partition estimates of `field`, ordered by `(year, sex)`.
    ///
    /// Partitions without a single observed value are absent.
    pub fn group_estimates(
        events: &[AthleteEvent],
        field: NumericField,
        estimator: Estimator,
    ) -> Vec<GroupEstimate> {
        let mut partitions: BTreeMap<(i32, Sex), Vec<f64>> = BTreeMap::new();
        for event in events {
            if let Some(value) = field.get(event) {
                partitions.entry(event.partition()).or_default().push(value);
            }
        }

        partitions
            .into_par_iter()
            .filter_map(|((year, sex), values)| {
                let value = match estimator {
                    Estimator::Median => StatsCalculator::median(&values),
                    Estimator::Mean => StatsCalculator::mean(&values),
                }?;
                Some(GroupEstimate {
                    year,
                    sex,
                    value,
                    observations: values.len(),
                })
            })
            .collect()
    }

    /// Run the full cleaning chain: dedup, medals, weight, height.
    pub fn clean(
        events: &[AthleteEvent],
        policy: ImputationPolicy,
    ) -> Result<CleanedTable, ImputationError> {
        let mut summary = CleaningSummary {
            rows_loaded: events.len(),
            ..CleaningSummary::default()
        };

        let deduped = Self::deduplicate(events);
        summary.duplicates_removed = events.len() - deduped.len();
        debug!(removed = summary.duplicates_removed, "deduplicated rows");

        summary.medals_filled = deduped.iter().filter(|e| e.medal.is_none()).count();
        let with_medals = Self::fill_missing_medals(&deduped);

        let (with_weight, weight) =
            Self::impute_field(&with_medals, NumericField::Weight, Estimator::Median, policy)?;
        summary.weights_imputed = weight.imputed;
        summary.weights_missing = weight.missing;

        let (cleaned, height) =
            Self::impute_field(&with_weight, NumericField::Height, Estimator::Mean, policy)?;
        summary.heights_imputed = height.imputed;
        summary.heights_missing = height.missing;

        info!(
            rows = cleaned.len(),
            duplicates = summary.duplicates_removed,
            weights_imputed = summary.weights_imputed,
            heights_imputed = summary.heights_imputed,
            "cleaned athlete events"
        );

        Ok(CleanedTable {
            events: cleaned,
            summary,
        })
    }

    /// Estimates come only from values present before this pass, so the
    /// result does not depend on row order.
    fn impute_field(
        events: &[AthleteEvent],
        field: NumericField,
        estimator: Estimator,
        policy: ImputationPolicy,
    ) -> Result<(Vec<AthleteEvent>, ImputeOutcome), ImputationError> {
        let estimates: HashMap<(i32, Sex), f64> = Self::group_estimates(events, field, estimator)
            .into_iter()
            .map(|estimate| ((estimate.year, estimate.sex), estimate.value))
            .collect();

        let mut outcome = ImputeOutcome::default();
        let mut empty_partitions = BTreeSet::new();
        let mut imputed = Vec::with_capacity(events.len());

        for event in events {
            let mut event = event.clone();
            if field.get(&event).is_none() {
                match estimates.get(&event.partition()) {
                    Some(&value) => {
                        field.set(&mut event, value);
                        outcome.imputed += 1;
                    }
                    None if policy == ImputationPolicy::Fail => {
                        return Err(ImputationError::EmptyPartition {
                            field,
                            year: event.year,
                            sex: event.sex,
                        });
                    }
                    None => {
                        outcome.missing += 1;
                        empty_partitions.insert(event.partition());
                    }
                }
            }
            imputed.push(event);
        }

        for (year, sex) in empty_partitions {
            warn!(%field, year, %sex, "no observations in partition, values left missing");
        }

        Ok((imputed, outcome))
    }
}
