use anyhow::{ensure, Result};
use geo::Coord;
use ndarray::s;

use crate::{combine::Combine, raster::Raster};

/// Relative tolerance when comparing cell sizes and grid offsets.
const ALIGN_TOLERANCE: f64 = 1e-6;

/// Mosaic tiles on a common grid into one raster covering all of them.
/// Tiles must share a cell size and be aligned to the same grid; where tiles overlap,
/// defined cells of later tiles overwrite earlier ones.
pub fn mosaic(tiles: &[Raster]) -> Result<Raster> {
    ensure!(!tiles.is_empty(), "[raster::mosaic] no tiles to mosaic");
    let cell = tiles[0].cell_size();

    for tile in tiles {
        ensure!((tile.cell_size() - cell).abs() <= ALIGN_TOLERANCE * cell,
            "[raster::mosaic] cell size {} differs from {}", tile.cell_size(), cell);
    }

    let min_x = tiles.iter().map(|t| t.extent().min().x).fold(f64::INFINITY, f64::min);
    let max_x = tiles.iter().map(|t| t.extent().max().x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = tiles.iter().map(|t| t.extent().min().y).fold(f64::INFINITY, f64::min);
    let max_y = tiles.iter().map(|t| t.extent().max().y).fold(f64::NEG_INFINITY, f64::max);

    let cols = ((max_x - min_x) / cell).round() as usize;
    let rows = ((max_y - min_y) / cell).round() as usize;
    let mut out = Raster::filled(Coord { x: min_x, y: max_y }, cell, rows, cols, f64::NAN)?;

    for tile in tiles {
        let col = grid_offset(tile.origin().x - min_x, cell)?;
        let row = grid_offset(max_y - tile.origin().y, cell)?;
        let (h, w) = (tile.rows(), tile.cols());
        ensure!(row + h <= rows && col + w <= cols,
            "[raster::mosaic] tile at ({row}, {col}) overruns the {rows}x{cols} mosaic");

        out.cells_mut()
            .slice_mut(s![row..row + h, col..col + w])
            .zip_mut_with(tile.cells(), |dst, &src| if !src.is_nan() { *dst = src });
    }

    Ok(out)
}

/// Convert a distance into a whole number of cells, failing if it is off-grid.
fn grid_offset(distance: f64, cell: f64) -> Result<usize> {
    let cells = distance / cell;
    let whole = cells.round();
    ensure!((cells - whole).abs() <= ALIGN_TOLERANCE * cells.abs().max(1.0),
        "[raster::mosaic] tile is not aligned to the mosaic grid (offset {cells} cells)");
    Ok(whole.max(0.0) as usize)
}

impl Combine for Raster {
    fn combine_many(parts: Vec<Self>) -> Result<Self> { mosaic(&parts) }
}
