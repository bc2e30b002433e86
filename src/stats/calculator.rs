//! Statistics Calculator Module
//! Descriptive statistics over a metric column.

use statrs::statistics::{Data, Median, Statistics};

/// Summary statistics for one column.
///
/// `std` is the population standard deviation (divides by N).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for ColumnStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        }
    }
}

impl ColumnStats {
    /// True when every value is identical (or there is at most one value).
    pub fn is_constant(&self) -> bool {
        self.count <= 1 || self.min == self.max || self.std == 0.0
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn describe(values: &[f64]) -> ColumnStats {
        let n = values.len();
        if n == 0 {
            return ColumnStats::default();
        }

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        ColumnStats {
            count: n,
            mean: values.iter().mean(),
            median: Data::new(values.to_vec()).median(),
            std: values.iter().population_std_dev(),
            min,
            max,
        }
    }

    /// Mean of the defined values, `None` if there are none.
    pub fn mean_of_present(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
        let present: Vec<f64> = values.into_iter().flatten().collect();
        if present.is_empty() {
            None
        } else {
            Some(present.iter().mean())
        }
    }

    /// Round to two decimals, ties to even.
    pub fn round2(value: f64) -> f64 {
        (value * 100.0).round_ties_even() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_uses_population_std() {
        let stats = StatsCalculator::describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert!((stats.std - 2.0).abs() < 1e-12);
        assert!((stats.median - 4.5).abs() < 1e-12);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert!(!stats.is_constant());
    }

    #[test]
    fn test_describe_empty() {
        let stats = StatsCalculator::describe(&[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
        assert!(stats.is_constant());
    }

    #[test]
    fn test_constant_column() {
        assert!(StatsCalculator::describe(&[0.1, 0.1, 0.1]).is_constant());
        assert!(StatsCalculator::describe(&[3.0]).is_constant());
    }

    #[test]
    fn test_mean_of_present_skips_missing() {
        let mean = StatsCalculator::mean_of_present([Some(0.2), None, Some(0.4)]).unwrap();
        assert!((mean - 0.3).abs() < 1e-12);
        assert_eq!(StatsCalculator::mean_of_present([None, None]), None);
    }

    #[test]
    fn test_round2() {
        assert_eq!(StatsCalculator::round2(5.9406), 5.94);
        assert_eq!(StatsCalculator::round2(12.0), 12.0);
    }

    #[test]
    fn test_round2_ties_go_to_even() {
        assert_eq!(StatsCalculator::round2(0.125), 0.12);
        assert_eq!(StatsCalculator::round2(0.375), 0.38);
        assert_eq!(StatsCalculator::round2(-0.125), -0.12);
        assert_eq!(StatsCalculator::round2(2.5), 2.5);
    }
}
