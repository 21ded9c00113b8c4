//! Tile grids, raster catalogs and per-zone tile selection.

mod catalog;
mod grid;
mod resolver;
mod store;

pub use catalog::TileCatalog;
pub use grid::{bng_square_name, TileGrid};
pub use resolver::{assemble, TileResolver, TileSelection};
pub use store::{DiskStore, MemStore, RasterStore};
