mod grid;
mod io;
mod mosaic;
mod zonal;

pub use grid::Raster;
pub use io::{read_geotiff, write_geotiff};
pub use mosaic::mosaic;
pub use zonal::{clip, cross_tabulate, describe, mask, rasterize};
