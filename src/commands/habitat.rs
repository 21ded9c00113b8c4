use anyhow::{bail, ensure, Result};

use crate::cli::{Cli, HabitatArgs};
use crate::commands::{prepare, run_zones};
use crate::common;
use crate::raster::read_geotiff;
use crate::source::HabitatSource;
use crate::tiles::{DiskStore, RasterStore, TileCatalog, TileGrid, TileResolver};
use crate::zone::read_zones;

pub fn run(cli: &Cli, args: &HabitatArgs) -> Result<()> {
    prepare(&args.output, args.force)?;
    common::require_file_exists(&args.zones)?;

    let source = match (&args.tiles, &args.raster) {
        (Some(dir), None) => {
            let store = DiskStore::new(dir);
            let catalog = TileCatalog::new(store.names()?, args.prefix_len);
            ensure!(!catalog.is_empty(), "[habitat] no GeoTIFF tiles found in {}", dir.display());

            let grid = match &args.grid {
                Some(path) => TileGrid::from_shapefile(path, &args.grid_field)?,
                None => TileGrid::british_national_grid(),
            };
            ensure!(grid.name_len() == args.prefix_len,
                "[habitat] tile names have {} characters but --prefix-len is {}", grid.name_len(), args.prefix_len);

            if cli.verbose > 0 {
                eprintln!("[habitat] {} rasters over {} grid tiles in {}", catalog.len(), grid.len(), dir.display());
            }
            HabitatSource::tiled(TileResolver::new(grid, catalog), Box::new(store), cli.verbose)
        }
        (None, Some(path)) => {
            common::require_file_exists(path)?;
            if cli.verbose > 0 {
                eprintln!("[habitat] single raster {}", path.display());
            }
            HabitatSource::single(read_geotiff(path)?, cli.verbose)
        }
        _ => bail!("[habitat] exactly one of --tiles or --raster is required"),
    };

    let zones = read_zones(&args.zones)?;
    run_zones(cli, &zones, &source, args.scratch.as_deref(), &args.output)
}
