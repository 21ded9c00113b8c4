use serde::{Deserialize, Serialize};

use crate::{common::{exact_sum, CompensatedSum}, values::ValueArray};

/// Unweighted and weight-weighted descriptive statistics of one zone's samples.
///
/// Values are kept at full precision; rounding happens only when a record is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedStatistics {
    /// Number of samples that took part.
    pub count: usize,
    /// Σ weight (metres of line, or square metres of raster).
    pub total_weight: f64,
    /// Σ value.
    pub total: f64,
    pub mean: f64,
    pub weighted_mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation (divisor = count).
    pub std: f64,
    /// √(Σ w·(v − weighted_mean)² / Σ w)
    pub weighted_std: f64,
}

impl WeightedStatistics {
    /// Compute over the defined samples of `samples`.
    /// Returns `None` when nothing takes part; the caller substitutes the zeroed result.
    pub fn compute(samples: &ValueArray) -> Option<Self> {
        let mut count = 0usize;
        let mut total = CompensatedSum::default();
        let mut total_weight = CompensatedSum::default();
        let mut weighted_total = CompensatedSum::default();
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for (value, weight) in samples.defined() {
            count += 1;
            total.add(value);
            total_weight.add(weight);
            weighted_total.add(value * weight);
            min = min.min(value);
            max = max.max(value);
        }
        if count == 0 { return None }

        let total = total.total();
        let total_weight = total_weight.total();
        let mean = total / count as f64;
        let weighted_mean = (weighted_total.total() / total_weight).clamp(min, max);

        // Second pass over deviations keeps the variance free of cancellation error.
        let variance = exact_sum(samples.defined().map(|(v, _)| (v - mean).powi(2))) / count as f64;
        let weighted_variance = exact_sum(
            samples.defined().map(|(v, w)| w * (v - weighted_mean).powi(2))
        ) / total_weight;

        Some(Self {
            count,
            total_weight,
            total,
            mean,
            weighted_mean,
            min,
            max,
            std: variance.max(0.0).sqrt(),
            weighted_std: weighted_variance.max(0.0).sqrt(),
        })
    }

    /// Statistics for cells of equal area, where weighted and unweighted moments coincide.
    pub fn from_cells(count: usize, cell_area: f64, total: f64, mean: f64, min: f64, max: f64, std: f64) -> Self {
        Self {
            count,
            total_weight: count as f64 * cell_area,
            total,
            mean,
            weighted_mean: mean,
            min,
            max,
            std,
            weighted_std: std,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn array(pairs: &[(f64, f64)]) -> ValueArray {
        ValueArray::new(
            pairs.iter().map(|&(v, _)| Some(v)).collect(),
            pairs.iter().map(|&(_, w)| w).collect(),
        ).unwrap()
    }

    #[test]
    fn two_segment_example() {
        let stats = WeightedStatistics::compute(&array(&[(0.5, 100.0), (2.0, 300.0)])).unwrap();
        assert_eq!(stats.count, 2);
        assert_abs_diff_eq!(stats.total_weight, 400.0);
        assert_abs_diff_eq!(stats.total, 2.5);
        assert_abs_diff_eq!(stats.mean, 1.25);
        assert_abs_diff_eq!(stats.weighted_mean, 1.625);
        assert_abs_diff_eq!(stats.min, 0.5);
        assert_abs_diff_eq!(stats.max, 2.0);
        assert_abs_diff_eq!(stats.std, 0.75);
        // Σw(v-μw)² / Σw = (100·1.265625 + 300·0.140625) / 400 = 0.421875
        assert_abs_diff_eq!(stats.weighted_std, 0.421875f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn empty_input_is_not_computed() {
        assert!(WeightedStatistics::compute(&ValueArray::default()).is_none());
        let only_null = ValueArray::new(vec![None, None], vec![1.0, 2.0]).unwrap();
        assert!(WeightedStatistics::compute(&only_null).is_none());
    }

    #[test]
    fn single_sample_has_zero_spread() {
        let stats = WeightedStatistics::compute(&array(&[(7.25, 12.0)])).unwrap();
        assert_eq!(stats.mean, 7.25);
        assert_eq!(stats.weighted_mean, 7.25);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.weighted_std, 0.0);
    }

    #[test]
    fn weighted_mean_is_convex_combination() {
        let samples = array(&[(3.0, 0.001), (-2.0, 1e6), (40.0, 17.5), (0.0, 3.0)]);
        let stats = WeightedStatistics::compute(&samples).unwrap();
        assert!(stats.min <= stats.weighted_mean && stats.weighted_mean <= stats.max);
    }

    #[test]
    fn large_offset_does_not_lose_variance() {
        let samples = array(&[(1e9 + 1.0, 1.0), (1e9 + 2.0, 1.0), (1e9 + 3.0, 1.0)]);
        let stats = WeightedStatistics::compute(&samples).unwrap();
        assert_abs_diff_eq!(stats.std, (2.0f64 / 3.0).sqrt(), epsilon = 1e-9);
        assert_abs_diff_eq!(stats.weighted_std, (2.0f64 / 3.0).sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn repeated_computation_is_identical() {
        let samples = array(&[(0.3, 13.1), (17.0, 2.2), (4.4, 90.0)]);
        assert_eq!(WeightedStatistics::compute(&samples), WeightedStatistics::compute(&samples));
    }
}
