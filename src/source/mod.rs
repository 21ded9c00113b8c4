//! Source datasets that zones are measured against.

mod habitat;
mod network;

pub use habitat::{Coverage, HabitatSource};
pub use network::{LineFeature, LineNetwork};

use anyhow::Result;
use sha2::Sha256;

use crate::{
    classify::{CrossTab, Scheme},
    error::ZoneError,
    stats::WeightedStatistics,
    values::ValueArray,
    zone::Zone,
};

/// A zone's sub-dataset, restricted to its footprint.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneData {
    /// Raw `(value, weight)` samples, e.g. clipped line segments.
    Samples(ValueArray),
    /// A zonal histogram of raster categories plus descriptive stats of the masked cells.
    Categories {
        counts: CrossTab,
        stats: Option<WeightedStatistics>,
        cell_area: f64,
    },
}

/// A read-only dataset that can be clipped to any zone, from any thread.
pub trait ZoneSource: Sync {
    /// Classification scheme the source's values are reported under.
    fn scheme(&self) -> Scheme;

    /// Restrict the dataset to one zone.
    fn extract(&self, zone: &Zone) -> Result<ZoneData, ZoneError>;

    /// Feed everything extraction depends on into a digest.
    /// Records stored under a different digest are never reused.
    fn fingerprint(&self, hasher: &mut Sha256) -> Result<()>;
}

impl ZoneSource for LineNetwork {
    fn scheme(&self) -> Scheme { Scheme::Capacity }

    fn extract(&self, zone: &Zone) -> Result<ZoneData, ZoneError> {
        self.clip_to_zone(zone.zone_id(), zone.footprint()).map(ZoneData::Samples)
    }

    fn fingerprint(&self, hasher: &mut Sha256) -> Result<()> {
        self.digest(hasher);
        Ok(())
    }
}

impl ZoneSource for HabitatSource {
    fn scheme(&self) -> Scheme { Scheme::HabitatIndex }

    fn extract(&self, zone: &Zone) -> Result<ZoneData, ZoneError> {
        HabitatSource::extract(self, zone.zone_id(), zone.footprint())
    }

    fn fingerprint(&self, hasher: &mut Sha256) -> Result<()> { self.digest(hasher) }
}
