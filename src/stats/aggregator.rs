//! Efficiency Aggregator Module
//! Medal-per-participation ratios by NOC and by NOC × year, computed with Polars.

use crate::config::JoinPolicy;
use crate::data::{AthleteEvent, EfficiencyRatio, NocRegion};
use polars::prelude::*;
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;
use tracing::{debug, info};

const NOC: &str = "NOC";
const YEAR: &str = "Year";
const WON_MEDAL: &str = "won_medal";
const REGION: &str = "region";
const TOTAL_MEDALS: &str = "total_medals";
const TOTAL_ATHLETES: &str = "total_athletes";
const RATIO: &str = "ratio";
const FIRST_SEEN: &str = "first_seen";

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("NOC codes without a region: {}", .nocs.join(", "))]
    JoinGap { nocs: Vec<String> },
}

/// Grouping key of a ratio table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Granularity {
    Noc,
    NocYear,
}

impl Granularity {
    fn keys(&self) -> Vec<Expr> {
        match self {
            Granularity::Noc => vec![col(NOC)],
            Granularity::NocYear => vec![col(NOC), col(YEAR)],
        }
    }
}

/// Builds the efficiency ratio tables from the cleaned athlete-event table.
pub struct EfficiencyAggregator;

impl EfficiencyAggregator {
    /// One row per NOC, sorted by ratio descending.
    pub fn global_ratios(
        events: &[AthleteEvent],
        regions: &[NocRegion],
        policy: JoinPolicy,
    ) -> Result<Vec<EfficiencyRatio>, AggregatorError> {
        Self::ratios(events, regions, Granularity::Noc, policy)
    }

    /// One row per (NOC, year), sorted by ratio descending.
    pub fn yearly_ratios(
        events: &[AthleteEvent],
        regions: &[NocRegion],
        policy: JoinPolicy,
    ) -> Result<Vec<EfficiencyRatio>, AggregatorError> {
        Self::ratios(events, regions, Granularity::NocYear, policy)
    }

    fn ratios(
        events: &[AthleteEvent],
        regions: &[NocRegion],
        granularity: Granularity,
        policy: JoinPolicy,
    ) -> Result<Vec<EfficiencyRatio>, AggregatorError> {
        Self::check_region_coverage(events, regions, policy)?;

        let keys = granularity.keys();
        let events_lf = Self::events_frame(events)?.lazy();

        // Participations, not distinct athletes. This side owns the key set.
        let total_athletes = events_lf
            .clone()
            .group_by_stable(keys.clone())
            .agg([len().alias(TOTAL_ATHLETES)])
            .with_row_index(FIRST_SEEN, None);

        let total_medals = events_lf
            .filter(col(WON_MEDAL))
            .group_by_stable(keys.clone())
            .agg([len().alias(TOTAL_MEDALS)]);

        let counts = total_athletes
            .join(total_medals, keys.clone(), keys, JoinArgs::new(JoinType::Left))
            .with_columns([
                col(TOTAL_MEDALS).fill_null(lit(0)).cast(DataType::UInt64),
                col(TOTAL_ATHLETES).cast(DataType::UInt64),
            ])
            .with_column(
                (col(TOTAL_MEDALS).cast(DataType::Float64)
                    / col(TOTAL_ATHLETES).cast(DataType::Float64))
                .alias(RATIO),
            );

        // The inner join only removes rows, so sorting after it with the
        // first-seen tiebreak gives the same order as a stable sort before it.
        let df = counts
            .join(
                Self::regions_frame(regions)?.lazy(),
                [col(NOC)],
                [col(NOC)],
                JoinArgs::new(JoinType::Inner),
            )
            .sort(
                [RATIO, FIRST_SEEN],
                SortMultipleOptions::default()
                    .with_order_descending_multi([true, false])
                    .with_maintain_order(true),
            )
            .collect()?;

        let ratios = Self::extract_ratios(&df, granularity)?;
        debug!(?granularity, rows = ratios.len(), "computed efficiency ratios");
        Ok(ratios)
    }

    /// NOCs that will be dropped by the region join.
    fn check_region_coverage(
        events: &[AthleteEvent],
        regions: &[NocRegion],
        policy: JoinPolicy,
    ) -> Result<(), AggregatorError> {
        let known: HashSet<&str> = regions.iter().map(|r| r.noc.as_str()).collect();
        let unmatched: BTreeSet<&str> = events
            .iter()
            .map(|e| e.noc.as_str())
            .filter(|noc| !known.contains(noc))
            .collect();

        if unmatched.is_empty() {
            return Ok(());
        }

        let nocs: Vec<String> = unmatched.into_iter().map(str::to_string).collect();
        match policy {
            JoinPolicy::Strict => Err(AggregatorError::JoinGap { nocs }),
            JoinPolicy::Silent => {
                info!(dropped = ?nocs, "NOC codes without a region excluded from ratios");
                Ok(())
            }
        }
    }

    fn events_frame(events: &[AthleteEvent]) -> PolarsResult<DataFrame> {
        let nocs: Vec<&str> = events.iter().map(|e| e.noc.as_str()).collect();
        let years: Vec<i32> = events.iter().map(|e| e.year).collect();
        let won: Vec<bool> = events.iter().map(AthleteEvent::won_medal).collect();

        DataFrame::new(vec![
            Column::new(NOC.into(), nocs),
            Column::new(YEAR.into(), years),
            Column::new(WON_MEDAL.into(), won),
        ])
    }

    fn regions_frame(regions: &[NocRegion]) -> PolarsResult<DataFrame> {
        let nocs: Vec<&str> = regions.iter().map(|r| r.noc.as_str()).collect();
        let names: Vec<Option<&str>> = regions.iter().map(|r| r.region.as_deref()).collect();

        DataFrame::new(vec![
            Column::new(NOC.into(), nocs),
            Column::new(REGION.into(), names),
        ])
    }

    fn extract_ratios(
        df: &DataFrame,
        granularity: Granularity,
    ) -> PolarsResult<Vec<EfficiencyRatio>> {
        let nocs = df.column(NOC)?.str()?;
        let regions = df.column(REGION)?.str()?;
        let medals = df.column(TOTAL_MEDALS)?.u64()?;
        let athletes = df.column(TOTAL_ATHLETES)?.u64()?;
        let ratios = df.column(RATIO)?.f64()?;
        let years = match granularity {
            Granularity::Noc => None,
            Granularity::NocYear => Some(df.column(YEAR)?.i32()?),
        };

        Ok((0..df.height())
            .map(|i| EfficiencyRatio {
                noc: nocs.get(i).unwrap_or_default().to_string(),
                year: years.and_then(|y| y.get(i)),
                region: regions.get(i).map(str::to_string),
                total_medals: medals.get(i).unwrap_or_default(),
                total_athletes: athletes.get(i).unwrap_or_default(),
                ratio: ratios.get(i).unwrap_or_default(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::{event, region};
    use crate::data::{Medal, Sex};

    fn participations(noc: &str, year: i32, total: usize, medals: usize) -> Vec<AthleteEvent> {
        (0..total)
            .map(|i| {
                let medal = if i < medals { Medal::Gold } else { Medal::NoMedal };
                event(i as u32, noc, year, Sex::M, Some(medal))
            })
            .collect()
    }

    #[test]
    fn test_global_ratios_include_medalless_nocs() {
        let mut events = participations("XYZ", 2000, 5, 0);
        events.extend(participations("ABC", 2000, 10, 2));
        let regions = vec![region("ABC", "Alphaland"), region("XYZ", "Zedland")];

        let ratios =
            EfficiencyAggregator::global_ratios(&events, &regions, JoinPolicy::Silent).unwrap();

        assert_eq!(ratios.len(), 2);
        assert_eq!(ratios[0].noc, "ABC");
        assert_eq!(ratios[0].total_medals, 2);
        assert_eq!(ratios[0].total_athletes, 10);
        assert!((ratios[0].ratio - 0.2).abs() < 1e-12);
        assert_eq!(ratios[0].region.as_deref(), Some("Alphaland"));
        assert_eq!(ratios[0].year, None);
        assert_eq!(ratios[1].noc, "XYZ");
        assert_eq!(ratios[1].total_medals, 0);
        assert_eq!(ratios[1].ratio, 0.0);
    }

    #[test]
    fn test_unmapped_noc_is_dropped() {
        let mut events = participations("ABC", 2000, 4, 1);
        events.extend(participations("QQQ", 2000, 2, 2));
        let regions = vec![region("ABC", "Alphaland")];

        let ratios =
            EfficiencyAggregator::global_ratios(&events, &regions, JoinPolicy::Silent).unwrap();
        assert_eq!(ratios.len(), 1);
        assert_eq!(ratios[0].noc, "ABC");
    }

    #[test]
    fn test_strict_join_reports_gap() {
        let mut events = participations("ABC", 2000, 4, 1);
        events.extend(participations("QQQ", 2000, 2, 2));
        let regions = vec![region("ABC", "Alphaland")];

        match EfficiencyAggregator::global_ratios(&events, &regions, JoinPolicy::Strict) {
            Err(AggregatorError::JoinGap { nocs }) => assert_eq!(nocs, vec!["QQQ".to_string()]),
            other => panic!("expected join gap, got {other:?}"),
        }
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let mut events = participations("BBB", 2000, 2, 1);
        events.extend(participations("AAA", 2000, 4, 2));
        events.extend(participations("CCC", 2000, 1, 1));
        let regions = vec![region("AAA", "A"), region("BBB", "B"), region("CCC", "C")];

        let ratios =
            EfficiencyAggregator::global_ratios(&events, &regions, JoinPolicy::Silent).unwrap();
        let order: Vec<&str> = ratios.iter().map(|r| r.noc.as_str()).collect();
        assert_eq!(order, vec!["CCC", "BBB", "AAA"]);
    }

    #[test]
    fn test_yearly_ratios_split_by_year() {
        let mut events = participations("ABC", 2000, 4, 1);
        events.extend(participations("ABC", 2004, 2, 2));
        let regions = vec![region("ABC", "Alphaland")];

        let ratios =
            EfficiencyAggregator::yearly_ratios(&events, &regions, JoinPolicy::Silent).unwrap();
        assert_eq!(ratios.len(), 2);
        assert_eq!(ratios[0].year, Some(2004));
        assert_eq!(ratios[0].ratio, 1.0);
        assert_eq!(ratios[1].year, Some(2000));
        assert!((ratios[1].ratio - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_ratio_table_is_sorted_and_bounded() {
        let mut events = Vec::new();
        for (noc, total, medals) in [("AAA", 7, 3), ("BBB", 3, 0), ("CCC", 9, 8), ("DDD", 1, 0)] {
            events.extend(participations(noc, 1996, total, medals));
        }
        let regions: Vec<NocRegion> = ["AAA", "BBB", "CCC", "DDD"]
            .iter()
            .map(|noc| region(noc, noc))
            .collect();

        let ratios =
            EfficiencyAggregator::global_ratios(&events, &regions, JoinPolicy::Silent).unwrap();
        assert!(ratios.windows(2).all(|w| w[0].ratio >= w[1].ratio));
        assert!(ratios.iter().all(|r| r.total_medals <= r.total_athletes));
    }

    #[test]
    fn test_empty_input() {
        let ratios = EfficiencyAggregator::global_ratios(&[], &[], JoinPolicy::Strict).unwrap();
        assert!(ratios.is_empty());
    }
}
