use serde::{Deserialize, Serialize};

use crate::{
    classify::{ClassBreakdown, Scheme},
    common::round2,
    stats::WeightedStatistics,
};

const CAPACITY_SUFFIXES: [&str; 5] = ["NONE", "RARE", "OCC", "FREQ", "PERV"];

/// Derived statistics of one zone. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneStatistics {
    pub summary: WeightedStatistics,
    pub breakdown: ClassBreakdown,
    /// Planar area of the zone polygon (m²).
    pub zone_area: f64,
}

impl ZoneStatistics {
    /// All-zero statistics for a zone without data. The zone area is kept.
    pub fn zeroed(scheme: Scheme, zone_area: f64) -> Self {
        Self {
            summary: WeightedStatistics::default(),
            breakdown: ClassBreakdown::zeroed(scheme),
            zone_area,
        }
    }

    #[inline] pub fn scheme(&self) -> Scheme { self.breakdown.scheme() }

    /// Named output fields, rounded to 2 decimals, in report order.
    pub fn fields(&self) -> Vec<(String, f64)> {
        let s = &self.summary;
        let divisor = self.scheme().report_unit_divisor();
        let mut fields = Vec::new();

        match self.scheme() {
            Scheme::Capacity => {
                fields.extend([
                    ("BDC_MEAN".to_string(), s.mean),
                    ("BDC_W_AVG".to_string(), s.weighted_mean),
                    ("BDC_TOT".to_string(), s.total),
                    ("BDC_MIN".to_string(), s.min),
                    ("BDC_MAX".to_string(), s.max),
                    ("BDC_STD".to_string(), s.std),
                    ("BDC_W_STD".to_string(), s.weighted_std),
                ]);
                let bins = self.breakdown.bins();
                fields.extend(CAPACITY_SUFFIXES.iter().zip(bins)
                    .map(|(suffix, share)| (format!("BDC_P_{suffix}"), share.percentage)));
                fields.extend(CAPACITY_SUFFIXES.iter().zip(bins)
                    .map(|(suffix, share)| (format!("BDC_km_{suffix}"), share.weight / divisor)));
                fields.push(("TOT_km".to_string(), self.breakdown.total_weight() / divisor));
            }
            Scheme::HabitatIndex => {
                fields.extend([
                    ("BHI_MEAN".to_string(), s.mean),
                    ("BHI_MIN".to_string(), s.min),
                    ("BHI_MAX".to_string(), s.max),
                    ("BHI_STD".to_string(), s.std),
                ]);
                let bins = self.scheme().bins();
                fields.extend(bins.iter().zip(self.breakdown.bins())
                    .map(|(bin, share)| (format!("BHI_PERC_{}", bin.name()), share.percentage)));
                fields.extend(bins.iter().zip(self.breakdown.apportion(self.zone_area))
                    .map(|(bin, area)| (format!("BHI_AREA_{}", bin.name()), area / divisor)));
            }
        }

        fields.into_iter().map(|(name, value)| (name, round2(value))).collect()
    }

    /// Geometry attributes reported next to the statistics. These are not zeroed for empty zones.
    pub fn geometry_fields(&self) -> Vec<(String, f64)> {
        match self.scheme() {
            Scheme::Capacity => Vec::new(),
            Scheme::HabitatIndex => vec![
                ("AREA_km2".to_string(), round2(self.zone_area / self.scheme().report_unit_divisor())),
            ],
        }
    }
}

/// How a zone's statistics were obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Measured from the zone's data.
    Computed,
    /// Measured, but the zone holds no source data; statistics are zero.
    Empty { reason: Option<String> },
    /// Could not be measured; statistics are zero-filled.
    Failed { message: String },
}

/// One output record: a zone's identifier and its derived statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub zone_id: u32,
    pub outcome: Outcome,
    pub statistics: ZoneStatistics,
}

impl ZoneRecord {
    #[inline] pub fn is_empty(&self) -> bool { matches!(self.outcome, Outcome::Empty { .. }) }

    #[inline] pub fn is_failed(&self) -> bool { matches!(self.outcome, Outcome::Failed { .. }) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classify::{Classifier, CrossTab}, values::ValueArray};

    fn field(fields: &[(String, f64)], name: &str) -> f64 {
        fields.iter().find(|(n, _)| n == name).map(|(_, v)| *v).unwrap()
    }

    #[test]
    fn capacity_fields() {
        let samples = ValueArray::new(vec![Some(0.5), Some(2.0)], vec![100.0, 300.0]).unwrap();
        let stats = ZoneStatistics {
            summary: WeightedStatistics::compute(&samples).unwrap(),
            breakdown: Classifier::new(Scheme::Capacity).classify(&samples),
            zone_area: 1e6,
        };
        let fields = stats.fields();

        assert_eq!(fields.len(), 18);
        assert_eq!(field(&fields, "BDC_MEAN"), 1.25);
        assert_eq!(field(&fields, "BDC_W_AVG"), 1.63);
        assert_eq!(field(&fields, "BDC_TOT"), 2.5);
        assert_eq!(field(&fields, "BDC_P_RARE"), 25.0);
        assert_eq!(field(&fields, "BDC_P_OCC"), 75.0);
        assert_eq!(field(&fields, "BDC_km_OCC"), 0.3);
        assert_eq!(field(&fields, "TOT_km"), 0.4);
        assert_eq!(field(&fields, "BDC_P_PERV"), 0.0);
    }

    #[test]
    fn habitat_fields_apportion_zone_area() {
        let table: CrossTab = [("0", 10), ("2", 30), ("5", 60)].into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let stats = ZoneStatistics {
            summary: WeightedStatistics::default(),
            breakdown: Classifier::new(Scheme::HabitatIndex).classify_counts(&table, 25.0),
            zone_area: 2_000_000.0,
        };
        let fields = stats.fields();

        assert_eq!(fields.len(), 16);
        assert_eq!(field(&fields, "BHI_PERC_2"), 30.0);
        assert_eq!(field(&fields, "BHI_AREA_5"), 1.2);
        assert_eq!(field(&fields, "BHI_AREA_1"), 0.0);
        assert_eq!(stats.geometry_fields(), vec![("AREA_km2".to_string(), 2.0)]);
    }

    #[test]
    fn zeroed_statistics_report_only_zeros() {
        for scheme in [Scheme::Capacity, Scheme::HabitatIndex] {
            let fields = ZoneStatistics::zeroed(scheme, 5e6).fields();
            assert!(fields.iter().all(|(_, v)| *v == 0.0));
        }
    }

    #[test]
    fn records_round_trip_through_json() {
        let record = ZoneRecord {
            zone_id: 3,
            outcome: Outcome::Empty { reason: Some("no data".into()) },
            statistics: ZoneStatistics::zeroed(Scheme::Capacity, 12.5),
        };
        let back: ZoneRecord = serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
        assert_eq!(back, record);
        assert!(back.is_empty() && !back.is_failed());
    }
}
