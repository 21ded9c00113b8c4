use crate::{
    classify::{Classifier, Scheme},
    error::ZoneError,
    record::{Outcome, ZoneRecord, ZoneStatistics},
    source::{ZoneData, ZoneSource},
    stats::WeightedStatistics,
    zone::Zone,
};

/// Turn one zone's extracted data into statistics. `None` means the zone holds no data.
pub fn summarize(zone: &Zone, data: &ZoneData, scheme: Scheme) -> Option<ZoneStatistics> {
    let classifier = Classifier::new(scheme);
    match data {
        ZoneData::Samples(samples) => Some(ZoneStatistics {
            summary: WeightedStatistics::compute(samples)?,
            breakdown: classifier.classify(samples),
            zone_area: zone.area(),
        }),
        ZoneData::Categories { counts, stats, cell_area } => {
            if counts.values().sum::<u64>() == 0 { return None }
            Some(ZoneStatistics {
                summary: stats.unwrap_or_default(),
                breakdown: classifier.classify_counts(counts, *cell_area),
                zone_area: zone.area(),
            })
        }
    }
}

/// Lifecycle of one zone: `Selected → DataExtracted → Computed | Empty → Written`.
#[derive(Debug)]
pub enum ZoneState<'a> {
    Selected(&'a Zone),
    DataExtracted(&'a Zone, ZoneData),
    Computed(&'a Zone, ZoneStatistics),
    /// No data, or not measurable. Carries the reason, if there is one.
    Empty(&'a Zone, Option<ZoneError>),
    Written(ZoneRecord),
}

impl<'a> ZoneState<'a> {
    /// Advance one step. Extraction failures never escape: they move the zone to `Empty`.
    pub fn step(self, source: &dyn ZoneSource) -> Self {
        match self {
            Self::Selected(zone) => match source.extract(zone) {
                Ok(data) => Self::DataExtracted(zone, data),
                Err(err) => Self::Empty(zone, Some(err)),
            },
            Self::DataExtracted(zone, data) => match summarize(zone, &data, source.scheme()) {
                Some(statistics) => Self::Computed(zone, statistics),
                None => Self::Empty(zone, None),
            },
            Self::Computed(zone, statistics) => Self::Written(ZoneRecord {
                zone_id: zone.zone_id(),
                outcome: Outcome::Computed,
                statistics,
            }),
            Self::Empty(zone, reason) => {
                let outcome = match reason {
                    Some(err) if !err.is_coverage_miss() => Outcome::Failed { message: zone_message(zone, &err) },
                    reason => Outcome::Empty { reason: reason.map(|e| zone_message(zone, &e)) },
                };
                Self::Written(ZoneRecord {
                    zone_id: zone.zone_id(),
                    outcome,
                    statistics: ZoneStatistics::zeroed(source.scheme(), zone.area()),
                })
            }
            written @ Self::Written(_) => written,
        }
    }

    #[inline] pub fn is_written(&self) -> bool { matches!(self, Self::Written(_)) }
}

/// Error text that names the zone exactly once.
fn zone_message(zone: &Zone, err: &ZoneError) -> String {
    match err.zone_id() {
        Some(_) => err.to_string(),
        None => format!("zone {}: {err}", zone.zone_id()),
    }
}

/// Run a zone through its whole lifecycle.
pub fn measure_zone(zone: &Zone, source: &dyn ZoneSource) -> ZoneRecord {
    let mut state = ZoneState::Selected(zone);
    loop {
        state = match state.step(source) {
            ZoneState::Written(record) => return record,
            next => next,
        };
    }
}
