use thiserror::Error;

/// Failures that can occur while measuring a single zone.
///
/// Coverage misses (`NoIntersection`, `OutsideCoverage`) degrade the zone to the
/// empty outcome. Everything else is still isolated to the zone, but reported as a
/// failure rather than as "measured, no data".
#[derive(Debug, Error)]
pub enum ZoneError {
    /// The zone and the source dataset do not overlap.
    #[error("zone {zone_id} does not intersect the source dataset")]
    NoIntersection { zone_id: u32 },

    /// No raster tile covers the zone footprint.
    #[error("zone {zone_id} lies outside the raster tile coverage")]
    OutsideCoverage { zone_id: u32 },

    /// The input is unusable as a whole (e.g. zero zones supplied).
    #[error("malformed zone input: {0}")]
    MalformedInput(String),

    /// A raster could not be decoded, aligned or mosaicked for this zone.
    #[error("raster failure in zone {zone_id}: {message}")]
    Raster { zone_id: u32, message: String },

    /// An I/O failure while handling this zone.
    #[error("i/o failure in zone {zone_id}: {source}")]
    Io {
        zone_id: u32,
        #[source]
        source: std::io::Error,
    },

    /// The scratch workspace could not be created or removed.
    #[error("scratch workspace failure: {0}")]
    Scratch(#[source] std::io::Error),
}

impl ZoneError {
    /// True for the two "zone has no data" kinds that degrade to the empty outcome.
    pub fn is_coverage_miss(&self) -> bool {
        matches!(self, Self::NoIntersection { .. } | Self::OutsideCoverage { .. })
    }

    /// The zone this error belongs to, if it is zone-scoped.
    pub fn zone_id(&self) -> Option<u32> {
        match self {
            Self::NoIntersection { zone_id }
            | Self::OutsideCoverage { zone_id }
            | Self::Raster { zone_id, .. }
            | Self::Io { zone_id, .. } => Some(*zone_id),
            Self::MalformedInput(_) | Self::Scratch(_) => None,
        }
    }

    /// Wrap an arbitrary raster-level error for a zone.
    pub(crate) fn raster(zone_id: u32, err: impl std::fmt::Display) -> Self {
        Self::Raster { zone_id, message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_misses_are_recoverable() {
        assert!(ZoneError::NoIntersection { zone_id: 1 }.is_coverage_miss());
        assert!(ZoneError::OutsideCoverage { zone_id: 1 }.is_coverage_miss());
        assert!(!ZoneError::raster(1, "bad tile").is_coverage_miss());
        assert!(!ZoneError::MalformedInput("no zones".into()).is_coverage_miss());
    }

    #[test]
    fn zone_id_is_reported() {
        assert_eq!(ZoneError::OutsideCoverage { zone_id: 9 }.zone_id(), Some(9));
        assert_eq!(ZoneError::MalformedInput("x".into()).zone_id(), None);
    }

    #[test]
    fn display_names_zone() {
        let err = ZoneError::OutsideCoverage { zone_id: 42 };
        assert!(err.to_string().contains("42"));
    }
}
