use geo::{Area, BoundingRect, MultiPolygon, Rect};
use serde::{Deserialize, Serialize};

/// A non-geometric attribute carried through from the input zone record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
    Null,
}

/// One polygon unit for which statistics are computed.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    zone_id: u32,
    attributes: Vec<(String, AttributeValue)>,
    footprint: MultiPolygon<f64>,
}

impl Zone {
    pub fn new(zone_id: u32, attributes: Vec<(String, AttributeValue)>, footprint: MultiPolygon<f64>) -> Self {
        Self { zone_id, attributes, footprint }
    }

    /// Stable 1-based identifier, assigned from input order.
    #[inline] pub fn zone_id(&self) -> u32 { self.zone_id }

    /// Original attribute fields, in a deterministic order.
    #[inline] pub fn attributes(&self) -> &[(String, AttributeValue)] { &self.attributes }

    #[inline] pub fn footprint(&self) -> &MultiPolygon<f64> { &self.footprint }

    /// Planar polygon area, in squared source units (m² for projected grids).
    pub fn area(&self) -> f64 { self.footprint.unsigned_area() }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> { self.footprint.bounding_rect() }

    /// Look up an original attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Field names that identify a zone and are replaced by the assigned `zone_id`.
const ID_FIELDS: [&str; 2] = ["zone_id", "zone_no"];

/// Give zones the identifiers 1..=N in input order, dropping any pre-existing
/// `zone_id`-like attribute so identifiers are never reused from the source.
pub fn assign_sequential_zone_ids(
    zones: impl IntoIterator<Item = (Vec<(String, AttributeValue)>, MultiPolygon<f64>)>,
) -> Vec<Zone> {
    zones.into_iter()
        .zip(1..)
        .map(|((mut attributes, footprint), zone_id)| {
            attributes.retain(|(name, _)| !ID_FIELDS.iter().any(|id| id.eq_ignore_ascii_case(name)));
            Zone::new(zone_id, attributes, footprint)
        })
        .collect()
}
