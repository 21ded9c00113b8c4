use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use geo::{BoundingRect, Coord, Intersects, MultiPolygon, Rect};
use rstar::{RTree, RTreeObject, AABB};
use sha2::Sha256;
use shapefile::{dbase::FieldValue, Shape};

use crate::common;

/// Side of a British National Grid 100 km square, in metres.
const BNG_SQUARE: f64 = 100_000.0;

/// A tile extent in an R-tree, associated with a tile name by index.
#[derive(Debug, Clone)]
struct TileBox {
    idx: usize, // Index of corresponding name in TileGrid::names
    bbox: Rect<f64>,
}

impl RTreeObject for TileBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// A regular tiling of the study area into named rectangles.
/// Every tile name has the same length, which is the prefix length raster files are keyed by.
#[derive(Debug, Clone)]
pub struct TileGrid {
    names: Vec<String>,
    extents: Vec<Rect<f64>>,
    rtree: RTree<TileBox>,
}

impl TileGrid {
    /// Build a grid from named tile extents.
    pub fn new(tiles: Vec<(String, Rect<f64>)>) -> Result<Self> {
        ensure!(!tiles.is_empty(), "[tiles::grid] tile grid has no tiles");
        let len = tiles[0].0.len();
        ensure!(len > 0, "[tiles::grid] tile names must not be empty");
        if let Some((name, _)) = tiles.iter().find(|(name, _)| name.len() != len) {
            bail!("[tiles::grid] tile name {name:?} breaks the fixed name length {len}");
        }

        let (names, extents) = tiles.into_iter().unzip();
        Ok(Self::build(names, extents))
    }

    fn build(names: Vec<String>, extents: Vec<Rect<f64>>) -> Self {
        let rtree = RTree::bulk_load(
            extents.iter().enumerate()
                .map(|(idx, &bbox)| TileBox { idx, bbox })
                .collect()
        );
        Self { names, extents, rtree }
    }

    /// The British National Grid 100 km squares (two-letter names, e.g. `SU`, `NT`).
    pub fn british_national_grid() -> Self {
        let (names, extents) = (0..13)
            .flat_map(|row| (0..7).map(move |col| (col, row)))
            .filter_map(|(col, row)| {
                let min = Coord { x: col as f64 * BNG_SQUARE, y: row as f64 * BNG_SQUARE };
                let max = Coord { x: min.x + BNG_SQUARE, y: min.y + BNG_SQUARE };
                bng_square_name(min.x, min.y).map(|name| (name, Rect::new(min, max)))
            })
            .unzip();
        Self::build(names, extents)
    }

    /// Load a grid from a polygon shapefile with a character name field (e.g. `TILE_NAME`).
    pub fn from_shapefile(path: &Path, name_field: &str) -> Result<Self> {
        let tiles = common::read_shapefile(path)?.into_iter()
            .map(|(shape, record)| -> Result<(String, Rect<f64>)> {
                let name = match record.get(name_field) {
                    Some(FieldValue::Character(Some(s))) => s.trim().to_string(),
                    _ => bail!("[tiles::grid] missing or invalid character field: {name_field}"),
                };
                let bbox = match shape {
                    Shape::Polygon(polygon) => common::shp_to_geo(&polygon).bounding_rect(),
                    other => bail!("[tiles::grid] found non-Polygon shape in tile grid: {:?}", other.shapetype()),
                }.with_context(|| format!("[tiles::grid] tile {name:?} has no geometry"))?;
                Ok((name, bbox))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(tiles)
    }

    /// Number of tiles.
    #[inline] pub fn len(&self) -> usize { self.names.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.names.is_empty() }

    /// Length of every tile name.
    #[inline] pub fn name_len(&self) -> usize { self.names[0].len() }

    /// Extent of a named tile.
    pub fn extent(&self, name: &str) -> Option<Rect<f64>> {
        self.names.iter().position(|n| n == name).map(|i| self.extents[i])
    }

    /// Feed every tile name and extent into a digest.
    pub(crate) fn digest(&self, hasher: &mut Sha256) {
        for (name, extent) in self.names.iter().zip(&self.extents) {
            common::digest_str(hasher, name);
            common::digest_coords(hasher, extent);
        }
    }

    /// Sorted, de-duplicated names of the tiles whose extents intersect `footprint`.
    pub fn intersecting(&self, footprint: &MultiPolygon<f64>) -> Vec<&str> {
        let Some(bbox) = footprint.bounding_rect() else { return Vec::new() };
        let envelope = AABB::from_corners(bbox.min().into(), bbox.max().into());

        let mut names = self.rtree.locate_in_envelope_intersecting(&envelope)
            .filter(|tile| footprint.intersects(&tile.bbox))
            .map(|tile| self.names[tile.idx].as_str())
            .collect::<Vec<_>>();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Two-letter British National Grid name of the 100 km square containing (easting, northing).
pub fn bng_square_name(easting: f64, northing: f64) -> Option<String> {
    if !(0.0..700_000.0).contains(&easting) || !(0.0..1_300_000.0).contains(&northing) {
        return None;
    }
    let e = (easting / BNG_SQUARE).floor() as u32;
    let n = (northing / BNG_SQUARE).floor() as u32;

    // 500 km letter, then 100 km letter; both from a 5x5 alphabet that skips 'I'.
    let mut first = (19 - n) - (19 - n) % 5 + (e + 10) / 5;
    let mut second = (19 - n) * 5 % 25 + e % 5;
    if first > 7 { first += 1 }
    if second > 7 { second += 1 }

    Some([first, second].iter().map(|&l| char::from(b'A' + l as u8)).collect())
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]])
    }

    #[test]
    fn national_grid_letters() {
        assert_eq!(bng_square_name(0.0, 0.0).as_deref(), Some("SV"));
        assert_eq!(bng_square_name(530_000.0, 180_000.0).as_deref(), Some("TQ"));
        assert_eq!(bng_square_name(325_000.0, 673_000.0).as_deref(), Some("NT"));
        assert_eq!(bng_square_name(450_000.0, 150_000.0).as_deref(), Some("SU"));
        assert_eq!(bng_square_name(-1.0, 0.0), None);
        assert_eq!(bng_square_name(0.0, 1_300_000.0), None);
    }

    #[test]
    fn national_grid_has_every_square() {
        let grid = TileGrid::british_national_grid();
        assert_eq!(grid.len(), 91);
        assert_eq!(grid.name_len(), 2);
        let su = grid.extent("SU").unwrap();
        assert_eq!(su.min(), Coord { x: 400_000.0, y: 100_000.0 });
    }

    #[test]
    fn zone_inside_one_square() {
        let grid = TileGrid::british_national_grid();
        let zone = square(410_000.0, 110_000.0, 420_000.0, 120_000.0);
        assert_eq!(grid.intersecting(&zone), vec!["SU"]);
    }

    #[test]
    fn zone_straddling_a_corner_hits_four_squares() {
        let grid = TileGrid::british_national_grid();
        let zone = square(390_000.0, 190_000.0, 410_000.0, 210_000.0);
        assert_eq!(grid.intersecting(&zone), vec!["SO", "SP", "ST", "SU"]);
    }

    #[test]
    fn zone_off_grid_hits_nothing() {
        let grid = TileGrid::british_national_grid();
        assert!(grid.intersecting(&square(-50_000.0, -50_000.0, -10_000.0, -10_000.0)).is_empty());
        assert!(grid.intersecting(&MultiPolygon(vec![])).is_empty());
    }

    #[test]
    fn names_must_share_a_length() {
        let rect = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        assert!(TileGrid::new(vec![("AB".into(), rect), ("ABC".into(), rect)]).is_err());
        assert!(TileGrid::new(vec![]).is_err());
    }
}
