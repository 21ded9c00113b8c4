use std::path::Path;

use anyhow::{Context, Result};
use shapefile as shp;

/// Read every shape and its dBase record from a .shp file.
pub(crate) fn read_shapefile(path: &Path) -> Result<Vec<(shp::Shape, shp::dbase::Record)>> {
    shp::read(path)
        .with_context(|| format!("[common::polygon] Failed to open shapefile: {}", path.display()))
}

/// Convert shapefile::Polygon to geo::MultiPolygon<f64>
pub(crate) fn shp_to_geo(p: &shp::Polygon) -> geo::MultiPolygon<f64> {
    // 1) Convert each ring into a LineString (ensure closed)
    let mut rings: Vec<(geo::LineString<f64>, bool /*is_exterior*/)> = Vec::with_capacity(p.rings().len());
    for ring in p.rings().iter() {
        let mut coords = ring.points().iter()
            .map(|pt| geo::Coord { x: pt.x, y: pt.y })
            .collect::<Vec<_>>();
        ensure_closed(&mut coords);
        // Shapefile stores exteriors clockwise.
        let is_exterior = signed_area(&coords) < 0.0;
        rings.push((geo::LineString(coords), is_exterior));
    }

    // 2) Group: each exterior with its following holes (Shapefile stores rings in this order)
    let mut polys: Vec<geo::Polygon<f64>> = Vec::new();
    let mut current_exterior: Option<geo::LineString<f64>> = None;
    let mut current_holes: Vec<geo::LineString<f64>> = Vec::new();

    for (ls, is_exterior) in rings {
        if is_exterior {
            if let Some(ext) = current_exterior.take() {
                polys.push(geo::Polygon::new(ext, std::mem::take(&mut current_holes)));
            }
            current_exterior = Some(ls);
        } else {
            current_holes.push(ls);
        }
    }
    if let Some(ext) = current_exterior {
        polys.push(geo::Polygon::new(ext, current_holes));
    }

    geo::MultiPolygon(polys)
}

/// Convert shapefile::Polyline to geo::MultiLineString<f64>, one LineString per part.
pub(crate) fn shp_polyline_to_geo(p: &shp::Polyline) -> geo::MultiLineString<f64> {
    geo::MultiLineString(
        p.parts().iter()
            .filter(|part| part.len() >= 2)
            .map(|part| geo::LineString(
                part.iter().map(|pt| geo::Coord { x: pt.x, y: pt.y }).collect()
            ))
            .collect()
    )
}

/// Planar length of a MultiLineString, in source units.
pub(crate) fn planar_length(mls: &geo::MultiLineString<f64>) -> f64 {
    mls.0.iter()
        .flat_map(|ls| ls.lines())
        .map(|line| line.dx().hypot(line.dy()))
        .sum()
}

/// Ensure first and last are the same for geo::LineString coords
fn ensure_closed(coords: &mut Vec<geo::Coord<f64>>) {
    if let (Some(&first), Some(&last)) = (coords.first(), coords.last()) {
        if first != last { coords.push(first) }
    }
}

/// Get the signed area of a geo::Coord list (negative for clockwise)
fn signed_area(pts: &[geo::Coord<f64>]) -> f64 {
    pts.windows(2)
        .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
        .sum::<f64>() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> shp::Point { shp::Point { x, y } }

    #[test]
    fn polygon_with_hole_keeps_ring_structure() {
        let polygon = shp::Polygon::with_rings(vec![
            shp::PolygonRing::Outer(vec![pt(0., 0.), pt(0., 10.), pt(10., 10.), pt(10., 0.), pt(0., 0.)]),
            shp::PolygonRing::Inner(vec![pt(2., 2.), pt(4., 2.), pt(4., 4.), pt(2., 4.), pt(2., 2.)]),
        ]);
        let mp = shp_to_geo(&polygon);
        assert_eq!(mp.0.len(), 1);
        assert_eq!(mp.0[0].interiors().len(), 1);
    }

    #[test]
    fn polyline_length_sums_parts() {
        let line = shp::Polyline::with_parts(vec![
            vec![pt(0., 0.), pt(3., 4.)],
            vec![pt(10., 10.), pt(10., 12.), pt(11., 12.)],
        ]);
        let mls = shp_polyline_to_geo(&line);
        assert_eq!(mls.0.len(), 2);
        assert!((planar_length(&mls) - 8.0).abs() < 1e-12);
    }
}
