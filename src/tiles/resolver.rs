use geo::MultiPolygon;

use crate::{
    combine::combine,
    error::ZoneError,
    raster::Raster,
    tiles::{RasterStore, TileCatalog, TileGrid},
};

/// Which rasters a zone needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileSelection {
    /// One raster covers the zone and is used as is.
    Single(String),
    /// Several rasters must be mosaicked first.
    Multiple(Vec<String>),
}

impl TileSelection {
    /// Raster names in the selection.
    pub fn names(&self) -> &[String] {
        match self {
            Self::Single(name) => std::slice::from_ref(name),
            Self::Multiple(names) => names,
        }
    }
}

/// Maps zone footprints to the raster files covering them.
#[derive(Debug, Clone)]
pub struct TileResolver {
    grid: TileGrid,
    catalog: TileCatalog,
}

impl TileResolver {
    pub fn new(grid: TileGrid, catalog: TileCatalog) -> Self { Self { grid, catalog } }

    #[inline] pub fn grid(&self) -> &TileGrid { &self.grid }

    #[inline] pub fn catalog(&self) -> &TileCatalog { &self.catalog }

    /// Select the rasters for a zone. Fails with `OutsideCoverage` when no raster covers it.
    pub fn resolve(&self, zone_id: u32, footprint: &MultiPolygon<f64>) -> Result<TileSelection, ZoneError> {
        let tiles = self.grid.intersecting(footprint);
        let mut names = self.catalog.select(&tiles).into_iter().map(str::to_string).collect::<Vec<_>>();
        match names.len() {
            0 => Err(ZoneError::OutsideCoverage { zone_id }),
            1 => Ok(TileSelection::Single(names.remove(0))),
            _ => Ok(TileSelection::Multiple(names)),
        }
    }
}

/// Load the selected rasters into the one raster the zone is measured against.
pub fn assemble(zone_id: u32, selection: &TileSelection, store: &dyn RasterStore) -> Result<Raster, ZoneError> {
    match selection {
        TileSelection::Single(name) => store.load(name).map_err(|e| ZoneError::raster(zone_id, format!("{e:#}"))),
        TileSelection::Multiple(names) => {
            let tiles = names.iter()
                .map(|name| store.load(name))
                .collect::<anyhow::Result<Vec<_>>>()
                .map_err(|e| ZoneError::raster(zone_id, format!("{e:#}")))?;
            combine(tiles).map_err(|e| ZoneError::raster(zone_id, format!("{e:#}")))
        }
    }
}
