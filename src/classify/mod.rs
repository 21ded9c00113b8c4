mod scheme;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use scheme::{Bin, Scheme};

use crate::{common::{exact_sum, CompensatedSum}, values::ValueArray};

/// Category label → pixel count, as produced by a zonal histogram.
pub type CrossTab = BTreeMap<String, u64>;

/// Weight and share of one bin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BinShare {
    /// Σ weight of the samples in this bin.
    pub weight: f64,
    /// 100 × weight / total weight.
    pub percentage: f64,
}

/// Per-bin weights of one zone under one scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassBreakdown {
    scheme: Scheme,
    bins: Vec<BinShare>,
    total_weight: f64,
    /// Weight that matched no bin (only possible for the habitat scheme).
    unclassified_weight: f64,
}

impl ClassBreakdown {
    /// All-zero breakdown for a zone without data.
    pub fn zeroed(scheme: Scheme) -> Self {
        Self {
            scheme,
            bins: vec![BinShare::default(); scheme.bins().len()],
            total_weight: 0.0,
            unclassified_weight: 0.0,
        }
    }

    /// Build from per-bin weight sums and the zone's total weight.
    fn from_weights(scheme: Scheme, weights: Vec<f64>, total_weight: f64) -> Self {
        let matched = exact_sum(weights.iter().copied());
        let bins = weights.into_iter()
            .map(|weight| BinShare {
                weight,
                percentage: if total_weight > 0.0 { 100.0 * weight / total_weight } else { 0.0 },
            })
            .collect();
        Self {
            scheme,
            bins,
            total_weight,
            unclassified_weight: (total_weight - matched).max(0.0),
        }
    }

    #[inline] pub fn scheme(&self) -> Scheme { self.scheme }

    /// Per-bin shares, in the scheme's fixed order.
    #[inline] pub fn bins(&self) -> &[BinShare] { &self.bins }

    /// Share of the bin with the given name.
    pub fn get(&self, name: &str) -> Option<&BinShare> {
        self.scheme.bins().iter()
            .position(|bin| bin.name() == name)
            .map(|i| &self.bins[i])
    }

    #[inline] pub fn total_weight(&self) -> f64 { self.total_weight }

    #[inline] pub fn unclassified_weight(&self) -> f64 { self.unclassified_weight }

    /// Apportion `total` across bins by percentage (e.g. a zone's polygon area).
    pub fn apportion(&self, total: f64) -> Vec<f64> {
        self.bins.iter().map(|share| total * share.percentage / 100.0).collect()
    }
}

/// Maps zone samples or category counts onto a scheme's bins.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    scheme: Scheme,
}

impl Classifier {
    pub fn new(scheme: Scheme) -> Self { Self { scheme } }

    #[inline] pub fn scheme(&self) -> Scheme { self.scheme }

    /// Classify raw `(value, weight)` samples.
    /// Percentages are taken against the weight of every defined sample.
    pub fn classify(&self, samples: &ValueArray) -> ClassBreakdown {
        let mut weights = vec![CompensatedSum::default(); self.scheme.bins().len()];
        let mut total = CompensatedSum::default();
        for (value, weight) in samples.defined() {
            total.add(weight);
            if let Some(i) = self.scheme.bin_of(value) {
                weights[i].add(weight);
            }
        }
        ClassBreakdown::from_weights(self.scheme, weights.iter().map(CompensatedSum::total).collect(), total.total())
    }

    /// Classify a pre-aggregated category → count table, each count weighing `weight_per_count`.
    /// Bins whose label is absent from the table get zero weight.
    pub fn classify_counts(&self, table: &CrossTab, weight_per_count: f64) -> ClassBreakdown {
        let mut counts = vec![0u64; self.scheme.bins().len()];
        let mut total = 0u64;
        for (label, &count) in table {
            total += count;
            if let Some(i) = self.scheme.bin_of_label(label) {
                counts[i] += count;
            }
        }

        // Shares come from integer counts, so they reconcile exactly before scaling.
        let mut breakdown = ClassBreakdown::from_weights(
            self.scheme,
            counts.iter().map(|&n| n as f64).collect(),
            total as f64,
        );
        for share in &mut breakdown.bins { share.weight *= weight_per_count }
        breakdown.total_weight *= weight_per_count;
        breakdown.unclassified_weight *= weight_per_count;
        breakdown
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::common::round2;

    fn samples(pairs: &[(f64, f64)]) -> ValueArray {
        ValueArray::new(
            pairs.iter().map(|&(v, _)| Some(v)).collect(),
            pairs.iter().map(|&(_, w)| w).collect(),
        ).unwrap()
    }

    #[test]
    fn capacity_example() {
        let breakdown = Classifier::new(Scheme::Capacity).classify(&samples(&[(0.5, 100.0), (2.0, 300.0)]));
        assert_eq!(breakdown.total_weight(), 400.0);
        assert_eq!(breakdown.get("rare").unwrap(), &BinShare { weight: 100.0, percentage: 25.0 });
        assert_eq!(breakdown.get("occasional").unwrap(), &BinShare { weight: 300.0, percentage: 75.0 });
        for name in ["none", "frequent", "pervasive"] {
            assert_eq!(breakdown.get(name).unwrap(), &BinShare::default());
        }
    }

    #[test]
    fn capacity_weights_reconcile_with_total() {
        let breakdown = Classifier::new(Scheme::Capacity).classify(&samples(&[
            (-1.0, 12.3), (0.7, 101.9), (3.3, 77.7), (8.0, 250.25), (40.0, 1.1), (0.0, 9.0),
        ]));
        let weight = breakdown.bins().iter().map(|b| b.weight).sum::<f64>();
        let percent = breakdown.bins().iter().map(|b| round2(b.percentage)).sum::<f64>();
        assert_abs_diff_eq!(weight, breakdown.total_weight(), epsilon = 0.01);
        assert_abs_diff_eq!(percent, 100.0, epsilon = 0.02);
        assert_eq!(breakdown.unclassified_weight(), 0.0);
    }

    #[test]
    fn total_weight_matches_the_statistics() {
        let pairs = [(0.5, 1e16), (0.5, 1.0), (0.5, 1.0), (2.0, 0.1), (2.0, 0.2)];
        let breakdown = Classifier::new(Scheme::Capacity).classify(&samples(&pairs));
        let stats = crate::stats::WeightedStatistics::compute(&samples(&pairs)).unwrap();
        assert_eq!(breakdown.total_weight(), stats.total_weight);
        assert_eq!(breakdown.get("rare").unwrap().weight, 1e16 + 2.0);
    }

    #[test]
    fn habitat_cross_tab_example() {
        let table: CrossTab = [("0", 10), ("2", 30), ("5", 60)].into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let breakdown = Classifier::new(Scheme::HabitatIndex).classify_counts(&table, 25.0);

        let percentages = breakdown.bins().iter().map(|b| b.percentage).collect::<Vec<_>>();
        assert_eq!(percentages, vec![10.0, 0.0, 30.0, 0.0, 0.0, 60.0]);
        assert_eq!(breakdown.total_weight(), 2500.0);
        assert_eq!(breakdown.get("2").unwrap().weight, 750.0);
    }

    #[test]
    fn habitat_area_scales_with_zone_area() {
        let table: CrossTab = [("1".to_string(), 1), ("4".to_string(), 3)].into_iter().collect();
        let breakdown = Classifier::new(Scheme::HabitatIndex).classify_counts(&table, 1.0);
        let small = breakdown.apportion(1_000.0);
        let large = breakdown.apportion(10_000.0);
        for (s, l) in small.iter().zip(&large) {
            assert_abs_diff_eq!(s * 10.0, *l, epsilon = 1e-9);
        }
        assert_eq!(large[4], 7_500.0);
    }

    #[test]
    fn unknown_labels_count_towards_total_only() {
        let table: CrossTab = [("3".to_string(), 75), ("9".to_string(), 25)].into_iter().collect();
        let breakdown = Classifier::new(Scheme::HabitatIndex).classify_counts(&table, 1.0);
        assert_eq!(breakdown.get("3").unwrap().percentage, 75.0);
        assert_eq!(breakdown.unclassified_weight(), 25.0);
    }

    #[test]
    fn empty_table_yields_zero_shares() {
        let breakdown = Classifier::new(Scheme::HabitatIndex).classify_counts(&CrossTab::new(), 25.0);
        assert_eq!(breakdown, ClassBreakdown::zeroed(Scheme::HabitatIndex));
    }
}
