use std::path::Path;

use anyhow::{bail, Result};
use geo::{BooleanOps, BoundingRect, Intersects, MultiLineString, MultiPolygon, Rect};
use rstar::{RTree, RTreeObject, AABB};
use sha2::{Digest, Sha256};
use shapefile::{dbase::FieldValue, Shape};

use crate::{
    combine::Combine,
    common,
    error::ZoneError,
    values::{ValueArray, ValueSample},
};

/// A line feature's bounding box in an R-tree, pointing back to the feature by index.
#[derive(Debug, Clone)]
struct FeatureBox {
    idx: usize,
    bbox: Rect<f64>,
}

impl RTreeObject for FeatureBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// A line feature with its (possibly null) attribute value.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFeature {
    pub value: Option<f64>,
    pub geometry: MultiLineString<f64>,
}

/// A river network: line features carrying a capacity value, spatially indexed.
#[derive(Debug, Clone)]
pub struct LineNetwork {
    features: Vec<LineFeature>,
    rtree: RTree<FeatureBox>,
}

impl LineNetwork {
    pub fn new(features: Vec<LineFeature>) -> Self {
        let rtree = RTree::bulk_load(
            features.iter().enumerate()
                .filter_map(|(idx, f)| f.geometry.bounding_rect().map(|bbox| FeatureBox { idx, bbox }))
                .collect()
        );
        Self { features, rtree }
    }

    /// Load polyline features from a shapefile, reading `field` as the value.
    /// Null values are kept and excluded later; a missing or non-numeric field is an error.
    pub fn from_shapefile(path: &Path, field: &str) -> Result<Self> {
        let features = common::read_shapefile(path)?.into_iter()
            .enumerate()
            .map(|(i, (shape, record))| {
                let geometry = match shape {
                    Shape::Polyline(line) => common::shp_polyline_to_geo(&line),
                    other => bail!("[source::network] record {i} in {} is a {:?}, not a polyline",
                        path.display(), other.shapetype()),
                };
                let value = match record.get(field) {
                    Some(FieldValue::Numeric(n)) => *n,
                    Some(FieldValue::Float(f)) => f.map(f64::from),
                    Some(FieldValue::Double(d)) => Some(*d),
                    Some(FieldValue::Integer(n)) => Some(f64::from(*n)),
                    _ => bail!("[source::network] missing or invalid numeric field {field} in {}", path.display()),
                };
                Ok(LineFeature { value, geometry })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(features))
    }

    /// Number of features.
    #[inline] pub fn len(&self) -> usize { self.features.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.features.is_empty() }

    #[inline] pub fn features(&self) -> &[LineFeature] { &self.features }

    /// Feed every feature's value and geometry into a digest.
    pub(crate) fn digest(&self, hasher: &mut Sha256) {
        for feature in &self.features {
            match feature.value {
                Some(v) => { hasher.update([1u8]); hasher.update(v.to_le_bytes()) }
                None => hasher.update([0u8]),
            }
            common::digest_coords(hasher, &feature.geometry);
        }
    }

    /// Clip the network to a zone: one sample per intersecting feature, weighted by the
    /// planar length of the part inside the zone.
    pub fn clip_to_zone(&self, zone_id: u32, footprint: &MultiPolygon<f64>) -> Result<ValueArray, ZoneError> {
        let Some(bbox) = footprint.bounding_rect() else {
            return Err(ZoneError::NoIntersection { zone_id });
        };
        let envelope = AABB::from_corners(bbox.min().into(), bbox.max().into());

        let mut candidates = self.rtree.locate_in_envelope_intersecting(&envelope)
            .map(|b| b.idx)
            .collect::<Vec<_>>();
        candidates.sort_unstable();

        let samples = candidates.into_iter()
            .map(|idx| &self.features[idx])
            .filter(|feature| footprint.intersects(&feature.geometry))
            .filter_map(|feature| {
                let length = common::planar_length(&footprint.clip(&feature.geometry, false));
                (length > 0.0).then(|| ValueSample::new(feature.value, length))
            })
            .collect::<ValueArray>();

        if samples.is_empty() {
            return Err(ZoneError::NoIntersection { zone_id });
        }
        Ok(samples)
    }
}

impl Combine for LineNetwork {
    fn combine_many(parts: Vec<Self>) -> Result<Self> {
        Ok(Self::new(parts.into_iter().flat_map(|p| p.features).collect()))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use geo::{line_string, polygon};

    use super::*;
    use crate::combine::combine;

    fn feature(value: Option<f64>, x0: f64, x1: f64, y: f64) -> LineFeature {
        LineFeature { value, geometry: MultiLineString(vec![line_string![(x: x0, y: y), (x: x1, y: y)]]) }
    }

    fn zone() -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0), (x: 0.0, y: 100.0)]])
    }

    #[test]
    fn clipped_lengths_become_weights() {
        let network = LineNetwork::new(vec![
            feature(Some(0.5), -50.0, 50.0, 10.0), // half inside
            feature(Some(2.0), 10.0, 90.0, 50.0),  // fully inside
            feature(Some(9.0), 200.0, 300.0, 50.0), // outside
        ]);
        let samples = network.clip_to_zone(1, &zone()).unwrap();
        let pairs = samples.defined().collect::<Vec<_>>();
        assert_eq!(pairs.len(), 2);
        assert_abs_diff_eq!(pairs[0].1, 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pairs[1].1, 80.0, epsilon = 1e-9);
    }

    #[test]
    fn null_values_survive_clipping_as_undefined() {
        let network = LineNetwork::new(vec![feature(None, 10.0, 20.0, 10.0)]);
        let samples = network.clip_to_zone(1, &zone()).unwrap();
        assert_eq!(samples.len(), 1);
        assert!(samples.has_no_data());
    }

    #[test]
    fn disjoint_zone_has_no_intersection() {
        let network = LineNetwork::new(vec![feature(Some(1.0), 200.0, 300.0, 50.0)]);
        assert!(matches!(network.clip_to_zone(4, &zone()), Err(ZoneError::NoIntersection { zone_id: 4 })));
    }

    #[test]
    fn networks_combine_into_one() {
        let a = LineNetwork::new(vec![feature(Some(1.0), 10.0, 20.0, 10.0)]);
        let b = LineNetwork::new(vec![feature(Some(3.0), 30.0, 60.0, 10.0)]);
        let merged = combine(vec![a, b]).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.clip_to_zone(1, &zone()).unwrap().defined_len(), 2);
    }
}
