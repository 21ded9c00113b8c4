//! Writing zone records out as CSV or GeoJSON.

use std::{fs::File, path::Path};

use ahash::AHashMap;
use anyhow::{bail, Context, Result};
use geo::MultiPolygon;
use polars::{frame::DataFrame, io::SerWriter, prelude::{Column, CsvWriter}};
use serde_json::{json, Map, Value};

use crate::{
    record::ZoneRecord,
    zone::{AttributeValue, Zone},
};

/// Output formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat { Csv, GeoJson }

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("geojson" | "json") => Ok(Self::GeoJson),
            _ => bail!("[output] Unsupported output extension (expected .csv, .geojson or .json): {}", path.display()),
        }
    }
}

/// Write records joined to their zones, in the format the path's extension names.
pub fn write_output(path: &Path, zones: &[Zone], records: &[ZoneRecord]) -> Result<()> {
    match OutputFormat::from_path(path)? {
        OutputFormat::Csv => write_csv(path, zones, records),
        OutputFormat::GeoJson => write_geojson(path, zones, records),
    }
}

/// Pair every record with its zone.
fn join<'a>(zones: &'a [Zone], records: &'a [ZoneRecord]) -> Result<Vec<(&'a Zone, &'a ZoneRecord)>> {
    let by_id = zones.iter().map(|z| (z.zone_id(), z)).collect::<AHashMap<_, _>>();
    records.iter()
        .map(|record| by_id.get(&record.zone_id)
            .map(|&zone| (zone, record))
            .with_context(|| format!("[output] record for unknown zone {}", record.zone_id)))
        .collect()
}

/// Attribute names across all zones, in first-seen order.
fn attribute_names(zones: &[&Zone]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for zone in zones {
        for (name, _) in zone.attributes() {
            if !names.contains(name) { names.push(name.clone()) }
        }
    }
    names
}

/// Build the output table: `zone_id`, original attributes, then statistic fields.
pub fn records_to_dataframe(zones: &[Zone], records: &[ZoneRecord]) -> Result<DataFrame> {
    let rows = join(zones, records)?;
    let row_zones = rows.iter().map(|(zone, _)| *zone).collect::<Vec<_>>();

    let mut columns = vec![
        Column::new("zone_id".into(), rows.iter().map(|(_, r)| r.zone_id).collect::<Vec<_>>()),
    ];

    for name in attribute_names(&row_zones) {
        let values = row_zones.iter().map(|zone| zone.attribute(&name)).collect::<Vec<_>>();
        let numeric = values.iter().all(|v| matches!(v, None | Some(AttributeValue::Number(_) | AttributeValue::Null)));
        columns.push(if numeric {
            Column::new(name.as_str().into(), values.iter()
                .map(|v| match v { Some(AttributeValue::Number(n)) => Some(*n), _ => None })
                .collect::<Vec<_>>())
        } else {
            Column::new(name.as_str().into(), values.iter()
                .map(|v| match v {
                    Some(AttributeValue::Text(s)) => Some(s.clone()),
                    Some(AttributeValue::Number(n)) => Some(n.to_string()),
                    _ => None,
                })
                .collect::<Vec<_>>())
        });
    }

    let stat_rows = rows.iter()
        .map(|(_, r)| {
            let mut fields = r.statistics.fields();
            fields.extend(r.statistics.geometry_fields());
            fields
        })
        .collect::<Vec<_>>();
    if let Some(first) = stat_rows.first() {
        for (i, (name, _)) in first.iter().enumerate() {
            columns.push(Column::new(name.as_str().into(),
                stat_rows.iter().map(|fields| fields[i].1).collect::<Vec<_>>()));
        }
    }

    Ok(DataFrame::new(columns)?)
}

/// Write records as CSV.
pub fn write_csv(path: &Path, zones: &[Zone], records: &[ZoneRecord]) -> Result<()> {
    let mut df = records_to_dataframe(zones, records)?;
    let file = File::create(path)
        .with_context(|| format!("[output] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(file)
        .finish(&mut df)
        .with_context(|| format!("[output] Failed to write CSV to {}", path.display()))
}

/// GeoJSON geometry of a multipolygon.
fn multipolygon_to_geojson(mp: &MultiPolygon<f64>) -> Value {
    let polygons = mp.0.iter()
        .map(|polygon| {
            std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .map(|ring| ring.coords().map(|c| vec![c.x, c.y]).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    json!({ "type": "MultiPolygon", "coordinates": polygons })
}

/// Records as a GeoJSON FeatureCollection carrying the zone geometry.
pub fn records_to_geojson(zones: &[Zone], records: &[ZoneRecord]) -> Result<Value> {
    let features = join(zones, records)?.into_iter()
        .map(|(zone, record)| {
            let mut properties = Map::new();
            properties.insert("zone_id".into(), json!(record.zone_id));
            for (name, value) in zone.attributes() {
                properties.insert(name.clone(), json!(value));
            }
            for (name, value) in record.statistics.fields().into_iter().chain(record.statistics.geometry_fields()) {
                properties.insert(name, json!(value));
            }
            json!({
                "type": "Feature",
                "geometry": multipolygon_to_geojson(zone.footprint()),
                "properties": properties,
            })
        })
        .collect::<Vec<_>>();

    Ok(json!({ "type": "FeatureCollection", "features": features }))
}

/// Write records as GeoJSON.
pub fn write_geojson(path: &Path, zones: &[Zone], records: &[ZoneRecord]) -> Result<()> {
    let collection = records_to_geojson(zones, records)?;
    let file = File::create(path)
        .with_context(|| format!("[output] Failed to create GeoJSON file: {}", path.display()))?;
    serde_json::to_writer(file, &collection)
        .with_context(|| format!("[output] Failed to write GeoJSON to {}", path.display()))
}
