use geo::{BoundingRect, Contains, MultiPolygon, Point};
use ndarray::{s, Array2, Zip};

use crate::{classify::CrossTab, raster::Raster, stats::WeightedStatistics, values::ValueArray};

/// Rasterize a zone footprint onto `template`'s grid: a cell is inside when its centre is.
/// Only cells in the footprint's window are tested.
pub fn rasterize(footprint: &MultiPolygon<f64>, template: &Raster) -> Array2<bool> {
    let mut mask = Array2::from_elem((template.rows(), template.cols()), false);
    let Some(bbox) = footprint.bounding_rect() else { return mask };
    let (rows, cols) = template.window(&bbox);
    let (row0, col0) = (rows.start, cols.start);

    Zip::indexed(mask.slice_mut(s![rows, cols])).par_for_each(|(row, col), inside| {
        *inside = footprint.contains(&Point::from(template.cell_center(row0 + row, col0 + col)));
    });
    mask
}

/// `raster` with every cell outside `mask` set undefined.
pub fn mask(mut raster: Raster, mask: &Array2<bool>) -> Raster {
    Zip::from(raster.cells_mut())
        .and(mask)
        .for_each(|value, &inside| if !inside { *value = f64::NAN });
    raster
}

/// The footprint's window of `raster`, with cells whose centres lie outside the footprint undefined.
pub fn clip(raster: &Raster, footprint: &MultiPolygon<f64>) -> Raster {
    let window = match footprint.bounding_rect() {
        Some(bbox) => {
            let (rows, cols) = raster.window(&bbox);
            raster.crop(rows, cols)
        }
        None => raster.crop(0..0, 0..0),
    };
    let inside = rasterize(footprint, &window);
    mask(window, &inside)
}

/// Mean/min/max/std of the defined cells, with each cell weighing its area.
pub fn describe(raster: &Raster) -> Option<WeightedStatistics> {
    WeightedStatistics::compute(&ValueArray::from_cells(raster.defined_values(), raster.cell_area()))
}

/// Zonal histogram: category label → number of defined cells carrying it.
pub fn cross_tabulate(raster: &Raster) -> CrossTab {
    let mut table = CrossTab::new();
    for value in raster.defined_values() {
        *table.entry(category_label(value)).or_default() += 1;
    }
    table
}

/// Integral values are labelled by their integer text ("3"), anything else verbatim.
fn category_label(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}
