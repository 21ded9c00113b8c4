use std::{collections::HashMap, path::Path};

use anyhow::{bail, Context, Result};
use shapefile::{dbase::{FieldValue, Record}, Shape};

use crate::{common, zone::{assign_sequential_zone_ids, AttributeValue, Zone}};

/// Read polygon zones and their attributes from a shapefile, numbering them 1..=N.
pub fn read_zones(path: &Path) -> Result<Vec<Zone>> {
    let zones = common::read_shapefile(path)?.into_iter()
        .enumerate()
        .map(|(i, (shape, record))| {
            let footprint = match shape {
                Shape::Polygon(polygon) => common::shp_to_geo(&polygon),
                other => bail!("[zone::io] record {i} is a {:?}, not a polygon", other.shapetype()),
            };
            Ok((record_attributes(record), footprint))
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("[zone::io] Error reading zones from {}", path.display()))?;

    Ok(assign_sequential_zone_ids(zones))
}

/// Convert a dBase record into attribute pairs, sorted by field name.
fn record_attributes(record: Record) -> Vec<(String, AttributeValue)> {
    let mut attributes = HashMap::<String, FieldValue>::from(record).into_iter()
        .map(|(name, value)| (name, attribute_value(value)))
        .collect::<Vec<_>>();
    attributes.sort_by(|a, b| a.0.cmp(&b.0));
    attributes
}

fn attribute_value(value: FieldValue) -> AttributeValue {
    match value {
        FieldValue::Character(Some(s)) => AttributeValue::Text(s.trim().to_string()),
        FieldValue::Memo(s) => AttributeValue::Text(s),
        FieldValue::Numeric(Some(n)) => AttributeValue::Number(n),
        FieldValue::Float(Some(f)) => AttributeValue::Number(f as f64),
        FieldValue::Double(d) | FieldValue::Currency(d) => AttributeValue::Number(d),
        FieldValue::Integer(i) => AttributeValue::Number(i as f64),
        FieldValue::Logical(Some(b)) => AttributeValue::Text(b.to_string()),
        FieldValue::Date(Some(d)) => AttributeValue::Text(format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())),
        _ => AttributeValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_values_map_to_attributes() {
        assert_eq!(attribute_value(FieldValue::Character(Some(" Tamar ".into()))), AttributeValue::Text("Tamar".into()));
        assert_eq!(attribute_value(FieldValue::Numeric(Some(3.5))), AttributeValue::Number(3.5));
        assert_eq!(attribute_value(FieldValue::Integer(4)), AttributeValue::Number(4.0));
        assert_eq!(attribute_value(FieldValue::Numeric(None)), AttributeValue::Null);
        assert_eq!(attribute_value(FieldValue::Logical(Some(true))), AttributeValue::Text("true".into()));
    }

    #[test]
    fn missing_zone_file_is_reported() {
        let err = read_zones(Path::new("/nonexistent/zones.shp")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to open shapefile"));
    }
}
