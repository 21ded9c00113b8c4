use std::ops::Range;

use anyhow::{ensure, Result};
use geo::{Coord, Rect};
use ndarray::{s, Array2};
use sha2::{Digest, Sha256};

/// A north-up raster with square cells. Undefined cells hold NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    origin: Coord<f64>, // Top-left corner (min x, max y)
    cell_size: f64,
    cells: Array2<f64>, // Indexed [row, col], row 0 at the top
}

impl Raster {
    /// Construct a raster from its top-left corner, cell size and cell values.
    pub fn new(origin: Coord<f64>, cell_size: f64, cells: Array2<f64>) -> Result<Self> {
        ensure!(cell_size.is_finite() && cell_size > 0.0, "[raster] invalid cell size {cell_size}");
        ensure!(origin.x.is_finite() && origin.y.is_finite(), "[raster] invalid origin {:?}", origin);
        Ok(Self { origin, cell_size, cells })
    }

    /// Construct a raster from row-major values.
    pub fn from_vec(origin: Coord<f64>, cell_size: f64, rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        ensure!(values.len() == rows * cols,
            "[raster] {} values do not fill a {rows}x{cols} grid", values.len());
        Self::new(origin, cell_size, Array2::from_shape_vec((rows, cols), values)?)
    }

    /// A raster with every cell set to `value`.
    pub fn filled(origin: Coord<f64>, cell_size: f64, rows: usize, cols: usize, value: f64) -> Result<Self> {
        Self::new(origin, cell_size, Array2::from_elem((rows, cols), value))
    }

    #[inline] pub fn rows(&self) -> usize { self.cells.nrows() }

    #[inline] pub fn cols(&self) -> usize { self.cells.ncols() }

    #[inline] pub fn origin(&self) -> Coord<f64> { self.origin }

    #[inline] pub fn cell_size(&self) -> f64 { self.cell_size }

    /// Area of one cell, in squared source units.
    #[inline] pub fn cell_area(&self) -> f64 { self.cell_size * self.cell_size }

    #[inline] pub fn cells(&self) -> &Array2<f64> { &self.cells }

    #[inline] pub(crate) fn cells_mut(&mut self) -> &mut Array2<f64> { &mut self.cells }

    /// Value at a cell, or `None` if out of range or undefined.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get((row, col)).copied().filter(|v| !v.is_nan())
    }

    /// Geographic extent of the raster.
    pub fn extent(&self) -> Rect<f64> {
        Rect::new(
            Coord { x: self.origin.x, y: self.origin.y - self.rows() as f64 * self.cell_size },
            Coord { x: self.origin.x + self.cols() as f64 * self.cell_size, y: self.origin.y },
        )
    }

    /// Centre of a cell.
    #[inline]
    pub fn cell_center(&self, row: usize, col: usize) -> Coord<f64> {
        Coord {
            x: self.origin.x + (col as f64 + 0.5) * self.cell_size,
            y: self.origin.y - (row as f64 + 0.5) * self.cell_size,
        }
    }

    /// Row and column ranges of the cells whose centres may fall inside `rect`.
    pub fn window(&self, rect: &Rect<f64>) -> (Range<usize>, Range<usize>) {
        let to_index = |offset: f64, len: usize| (offset.max(0.0) as usize).min(len);
        let col_start = to_index(((rect.min().x - self.origin.x) / self.cell_size - 0.5).floor(), self.cols());
        let col_end = to_index(((rect.max().x - self.origin.x) / self.cell_size + 0.5).ceil(), self.cols());
        let row_start = to_index(((self.origin.y - rect.max().y) / self.cell_size - 0.5).floor(), self.rows());
        let row_end = to_index(((self.origin.y - rect.min().y) / self.cell_size + 0.5).ceil(), self.rows());
        (row_start..row_end, col_start..col_end)
    }

    /// Copy of the cells in `rows` x `cols`, placed where they sit in this raster.
    /// Ranges are clamped to the grid.
    pub fn crop(&self, rows: Range<usize>, cols: Range<usize>) -> Raster {
        let clamp = |r: Range<usize>, len: usize| {
            let start = r.start.min(len);
            start..r.end.clamp(start, len)
        };
        let (rows, cols) = (clamp(rows, self.rows()), clamp(cols, self.cols()));
        let origin = Coord {
            x: self.origin.x + cols.start as f64 * self.cell_size,
            y: self.origin.y - rows.start as f64 * self.cell_size,
        };
        Raster {
            origin,
            cell_size: self.cell_size,
            cells: self.cells.slice(s![rows, cols]).to_owned(),
        }
    }

    /// Feed the georeference and every cell into a digest.
    pub(crate) fn digest(&self, hasher: &mut Sha256) {
        for x in [self.origin.x, self.origin.y, self.cell_size] {
            hasher.update(x.to_le_bytes());
        }
        hasher.update((self.rows() as u64).to_le_bytes());
        hasher.update((self.cols() as u64).to_le_bytes());
        for value in &self.cells {
            hasher.update(value.to_le_bytes());
        }
    }

    /// Iterate over defined cell values.
    pub fn defined_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.cells.iter().copied().filter(|v| !v.is_nan())
    }

    /// Number of defined cells.
    pub fn defined_count(&self) -> usize { self.defined_values().count() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster() -> Raster {
        Raster::from_vec(Coord { x: 100.0, y: 50.0 }, 10.0, 2, 3, vec![
            1.0, 2.0, f64::NAN,
            4.0, 5.0, 6.0,
        ]).unwrap()
    }

    #[test]
    fn extent_and_centres() {
        let r = raster();
        assert_eq!(r.extent(), Rect::new(Coord { x: 100.0, y: 30.0 }, Coord { x: 130.0, y: 50.0 }));
        assert_eq!(r.cell_center(1, 2), Coord { x: 125.0, y: 35.0 });
        assert_eq!(r.cell_area(), 100.0);
    }

    #[test]
    fn nan_cells_are_undefined() {
        let r = raster();
        assert_eq!(r.get(0, 2), None);
        assert_eq!(r.get(1, 2), Some(6.0));
        assert_eq!(r.get(5, 5), None);
        assert_eq!(r.defined_count(), 5);
    }

    #[test]
    fn window_is_clamped() {
        let r = raster();
        let (rows, cols) = r.window(&Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 112.0, y: 44.0 }));
        assert_eq!((rows, cols), (0..2, 0..2));
    }

    #[test]
    fn crop_keeps_georeference() {
        let r = raster();
        let c = r.crop(1..2, 1..3);
        assert_eq!((c.rows(), c.cols()), (1, 2));
        assert_eq!(c.origin(), Coord { x: 110.0, y: 40.0 });
        assert_eq!(c.get(0, 1), Some(6.0));
        assert_eq!(c.cell_center(0, 0), r.cell_center(1, 1));

        let clamped = r.crop(1..9, 2..9);
        assert_eq!((clamped.rows(), clamped.cols()), (1, 1));
        assert_eq!(r.crop(5..9, 0..3).rows(), 0);
    }

    #[test]
    fn bad_shapes_are_rejected() {
        assert!(Raster::from_vec(Coord { x: 0.0, y: 0.0 }, 1.0, 2, 2, vec![1.0; 3]).is_err());
        assert!(Raster::filled(Coord { x: 0.0, y: 0.0 }, 0.0, 1, 1, 0.0).is_err());
    }
}
