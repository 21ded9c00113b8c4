use std::borrow::Cow;

use anyhow::Result;
use geo::{BoundingRect, Intersects, MultiPolygon};
use sha2::{Digest, Sha256};

use crate::{
    error::ZoneError,
    raster::{clip, cross_tabulate, describe, Raster},
    source::ZoneData,
    tiles::{assemble, RasterStore, TileResolver, TileSelection},
};

/// Where habitat index rasters come from.
pub enum Coverage {
    /// Tiles on a naming grid, resolved per zone.
    Tiled { resolver: TileResolver, store: Box<dyn RasterStore> },
    /// One raster covering every zone.
    Single(Raster),
}

/// Beaver habitat index raster, measured per zone by cross-tabulating its categories.
pub struct HabitatSource {
    coverage: Coverage,
    verbose: u8,
}

impl HabitatSource {
    pub fn new(coverage: Coverage, verbose: u8) -> Self { Self { coverage, verbose } }

    pub fn tiled(resolver: TileResolver, store: Box<dyn RasterStore>, verbose: u8) -> Self {
        Self::new(Coverage::Tiled { resolver, store }, verbose)
    }

    pub fn single(raster: Raster, verbose: u8) -> Self { Self::new(Coverage::Single(raster), verbose) }

    /// The raster the zone is measured against.
    fn covering_raster(&self, zone_id: u32, footprint: &MultiPolygon<f64>) -> Result<Cow<'_, Raster>, ZoneError> {
        match &self.coverage {
            Coverage::Tiled { resolver, store } => {
                let selection = resolver.resolve(zone_id, footprint)?;
                if self.verbose > 1 {
                    match &selection {
                        TileSelection::Single(name) => eprintln!("[habitat] zone {zone_id} uses {name}"),
                        TileSelection::Multiple(names) => eprintln!(
                            "[habitat] zone {zone_id} spans {} tiles - mosaicking", names.len()),
                    }
                }
                Ok(Cow::Owned(assemble(zone_id, &selection, store.as_ref())?))
            }
            Coverage::Single(raster) => {
                let overlaps = footprint.bounding_rect()
                    .is_some_and(|bbox| bbox.intersects(&raster.extent()));
                if !overlaps {
                    return Err(ZoneError::OutsideCoverage { zone_id });
                }
                Ok(Cow::Borrowed(raster))
            }
        }
    }

    /// Feed the tile layout and stored rasters, or the single raster, into a digest.
    pub(crate) fn digest(&self, hasher: &mut Sha256) -> Result<()> {
        match &self.coverage {
            Coverage::Tiled { resolver, store } => {
                hasher.update(b"tiled");
                resolver.grid().digest(hasher);
                resolver.catalog().digest(hasher);
                store.fingerprint(hasher)
            }
            Coverage::Single(raster) => {
                hasher.update(b"single");
                raster.digest(hasher);
                Ok(())
            }
        }
    }

    /// Clip the covering raster to the zone, then tabulate and describe what is left.
    pub fn extract(&self, zone_id: u32, footprint: &MultiPolygon<f64>) -> Result<ZoneData, ZoneError> {
        let raster = self.covering_raster(zone_id, footprint)?;
        let masked = clip(&raster, footprint);
        Ok(ZoneData::Categories {
            counts: cross_tabulate(&masked),
            stats: describe(&masked),
            cell_area: masked.cell_area(),
        })
    }
}
