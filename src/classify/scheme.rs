use std::fmt;

use serde::{Deserialize, Serialize};

/// The two fixed classification schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scheme {
    /// Five ordered ranges over a continuous line attribute.
    Capacity,
    /// Six discrete integer categories `0..=5` of a raster class code.
    HabitatIndex,
}

/// How a bin decides membership.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BinRule {
    /// `value ≤ hi`
    AtMost(f64),
    /// `lo < value ≤ hi`
    Between(f64, f64),
    /// `value > lo`
    Above(f64),
    /// Exact category code.
    Category(i64),
}

/// One named range in a scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    name: &'static str,
    rule: BinRule,
}

const CAPACITY_BINS: [Bin; 5] = [
    Bin { name: "none", rule: BinRule::AtMost(0.0) },
    Bin { name: "rare", rule: BinRule::Between(0.0, 1.0) },
    Bin { name: "occasional", rule: BinRule::Between(1.0, 4.0) },
    Bin { name: "frequent", rule: BinRule::Between(4.0, 15.0) },
    Bin { name: "pervasive", rule: BinRule::Above(15.0) },
];

const HABITAT_BINS: [Bin; 6] = [
    Bin { name: "0", rule: BinRule::Category(0) },
    Bin { name: "1", rule: BinRule::Category(1) },
    Bin { name: "2", rule: BinRule::Category(2) },
    Bin { name: "3", rule: BinRule::Category(3) },
    Bin { name: "4", rule: BinRule::Category(4) },
    Bin { name: "5", rule: BinRule::Category(5) },
];

impl Bin {
    /// Bin name; for categorical bins this is also the category label.
    #[inline] pub fn name(&self) -> &'static str { self.name }

    /// True if `value` falls into this bin.
    pub fn contains(&self, value: f64) -> bool {
        match self.rule {
            BinRule::AtMost(hi) => value <= hi,
            BinRule::Between(lo, hi) => lo < value && value <= hi,
            BinRule::Above(lo) => value > lo,
            BinRule::Category(code) => value == code as f64,
        }
    }

    /// True if a cross-tabulation label names this bin.
    pub fn matches_label(&self, label: &str) -> bool {
        match self.rule {
            BinRule::Category(_) => label.trim() == self.name,
            _ => false,
        }
    }
}

impl Scheme {
    /// The scheme's bins in their fixed report order.
    pub fn bins(&self) -> &'static [Bin] {
        match self {
            Self::Capacity => &CAPACITY_BINS,
            Self::HabitatIndex => &HABITAT_BINS,
        }
    }

    /// Index of the bin containing `value`, if any.
    pub fn bin_of(&self, value: f64) -> Option<usize> {
        self.bins().iter().position(|bin| bin.contains(value))
    }

    /// Index of the bin named by a cross-tabulation label, if any.
    pub fn bin_of_label(&self, label: &str) -> Option<usize> {
        self.bins().iter().position(|bin| bin.matches_label(label))
    }

    /// Divisor turning the scheme's weight unit (m or m²) into its report unit (km or km²).
    pub fn report_unit_divisor(&self) -> f64 {
        match self {
            Self::Capacity => 1_000.0,
            Self::HabitatIndex => 1_000_000.0,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Capacity => "capacity",
            Self::HabitatIndex => "habitat-index",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.to_str()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_boundaries_are_half_open() {
        let s = Scheme::Capacity;
        assert_eq!(s.bin_of(-3.0), Some(0));
        assert_eq!(s.bin_of(0.0), Some(0));
        assert_eq!(s.bin_of(1e-9), Some(1));
        assert_eq!(s.bin_of(1.0), Some(1));
        assert_eq!(s.bin_of(1.5), Some(2));
        assert_eq!(s.bin_of(4.0), Some(2));
        assert_eq!(s.bin_of(4.01), Some(3));
        assert_eq!(s.bin_of(15.0), Some(3));
        assert_eq!(s.bin_of(15.01), Some(4));
        assert_eq!(s.bin_of(f64::NAN), None);
    }

    #[test]
    fn every_finite_value_has_exactly_one_capacity_bin() {
        for value in [-1e9, -0.5, 0.0, 0.3, 1.0, 2.2, 4.0, 9.9, 15.0, 16.0, 1e12] {
            let hits = Scheme::Capacity.bins().iter().filter(|b| b.contains(value)).count();
            assert_eq!(hits, 1, "value {value}");
        }
    }

    #[test]
    fn habitat_bins_match_labels_exactly() {
        let s = Scheme::HabitatIndex;
        assert_eq!(s.bins().len(), 6);
        assert_eq!(s.bin_of_label("3"), Some(3));
        assert_eq!(s.bin_of_label(" 5 "), Some(5));
        assert_eq!(s.bin_of_label("6"), None);
        assert_eq!(s.bin_of_label("3.0"), None);
        assert_eq!(s.bin_of(2.0), Some(2));
        assert_eq!(s.bin_of(2.5), None);
    }

    #[test]
    fn capacity_bins_ignore_labels() {
        assert_eq!(Scheme::Capacity.bin_of_label("none"), None);
    }
}
