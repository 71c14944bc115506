//! Statistics Calculator Module
//! Descriptive statistics and simple least-squares fits over athlete measurements.

use crate::data::AthleteEvent;
use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, Serialize)]
pub struct FieldStats {
    pub field: String,
    pub count: usize,
    pub missing: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub p05: f64,
    pub p95: f64,
}

impl Default for FieldStats {
    fn default() -> Self {
        Self {
            field: String::new(),
            count: 0,
            missing: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            variance: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            p05: f64::NAN,
            p95: f64::NAN,
        }
    }
}

/// Ordinary least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub n: usize,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

type FieldAccessor = fn(&AthleteEvent) -> Option<f64>;

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Median of `values`, `None` when empty.
    pub fn median(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Some(Self::sorted_median(&sorted))
    }

    fn sorted_median(sorted: &[f64]) -> f64 {
        let n = sorted.len();
        if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        }
    }

    /// Arithmetic mean of `values`, `None` when empty.
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(values.iter().mean())
    }

    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> FieldStats {
        let n = values.len();
        if n == 0 {
            return FieldStats::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = values.iter().mean();
        let median = Self::sorted_median(&sorted);

        // Sample variance; a single observation has none.
        let variance = if n > 1 { values.iter().variance() } else { 0.0 };

        FieldStats {
            count: n,
            mean,
            median,
            std: variance.sqrt(),
            variance,
            min: sorted[0],
            max: sorted[n - 1],
            p05: Self::percentile(&sorted, 5.0),
            p95: Self::percentile(&sorted, 95.0),
            ..FieldStats::default()
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Fit `y` against `x` by ordinary least squares.
    ///
    /// Returns `None` for mismatched lengths, fewer than two points, or a
    /// constant `x`. A constant `y` is fitted exactly (`r_squared = 1`).
    pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<LinearFit> {
        let n = x.len();
        if n != y.len() || n < 2 {
            return None;
        }

        let var_x = x.iter().variance();
        if var_x == 0.0 || !var_x.is_finite() {
            return None;
        }
        let var_y = y.iter().variance();
        let cov = x.iter().covariance(y.iter());

        let slope = cov / var_x;
        let intercept = y.iter().mean() - slope * x.iter().mean();
        let r_squared = if var_y == 0.0 {
            1.0
        } else {
            (cov * cov) / (var_x * var_y)
        };

        Some(LinearFit {
            slope,
            intercept,
            r_squared,
            n,
        })
    }

    /// Descriptive statistics for age, height and weight, computed in parallel.
    pub fn summarize_fields(events: &[AthleteEvent]) -> Vec<FieldStats> {
        let columns: [(&str, FieldAccessor); 3] = [
            ("age", |e: &AthleteEvent| e.age.map(f64::from)),
            ("height", |e: &AthleteEvent| e.height),
            ("weight", |e: &AthleteEvent| e.weight),
        ];

        columns
            .par_iter()
            .map(|(name, accessor)| {
                let values: Vec<f64> = events.iter().filter_map(|e| accessor(e)).collect();
                let mut stats = Self::compute_descriptive_stats(&values);
                stats.field = name.to_string();
                stats.missing = events.len() - values.len();
                stats
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::event;
    use crate::data::Sex;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(StatsCalculator::median(&[70.0, 72.0, 74.0, 1000.0]), Some(73.0));
        assert_eq!(StatsCalculator::median(&[80.0, 60.0, 70.0]), Some(70.0));
        assert_eq!(StatsCalculator::median(&[]), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(StatsCalculator::mean(&[1.0, 2.0, 6.0]), Some(3.0));
        assert_eq!(StatsCalculator::mean(&[]), None);
    }

    #[test]
    fn test_descriptive_stats() {
        let stats =
            StatsCalculator::compute_descriptive_stats(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.count, 8);
        assert!(approx(stats.mean, 5.0));
        assert!(approx(stats.median, 4.5));
        assert!(approx(stats.variance, 32.0 / 7.0));
        assert!(approx(stats.min, 2.0));
        assert!(approx(stats.max, 9.0));
    }

    #[test]
    fn test_descriptive_stats_empty() {
        let stats = StatsCalculator::compute_descriptive_stats(&[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert!(approx(StatsCalculator::percentile(&sorted, 50.0), 30.0));
        assert!(approx(StatsCalculator::percentile(&sorted, 95.0), 48.0));
    }

    #[test]
    fn test_linear_regression_exact_line() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [3.0, 5.0, 7.0, 9.0];
        let fit = StatsCalculator::linear_regression(&x, &y).unwrap();
        assert!(approx(fit.slope, 2.0));
        assert!(approx(fit.intercept, 1.0));
        assert!(approx(fit.r_squared, 1.0));
        assert!(approx(fit.predict(10.0), 21.0));
    }

    #[test]
    fn test_linear_regression_degenerate() {
        assert!(StatsCalculator::linear_regression(&[1.0], &[2.0]).is_none());
        assert!(StatsCalculator::linear_regression(&[1.0, 1.0], &[2.0, 3.0]).is_none());
        assert!(StatsCalculator::linear_regression(&[1.0, 2.0], &[2.0]).is_none());
    }

    #[test]
    fn test_summarize_fields_counts_missing() {
        let mut a = event(1, "USA", 2000, Sex::M, None);
        a.age = None;
        let b = event(2, "USA", 2000, Sex::M, None);
        let stats = StatsCalculator::summarize_fields(&[a, b]);
        let age = stats.iter().find(|s| s.field == "age").unwrap();
        assert_eq!(age.count, 1);
        assert_eq!(age.missing, 1);
        assert_eq!(stats.len(), 3);
    }
}
