//! GeoTIFF reading and writing.

use std::{fs::File, io::{BufReader, BufWriter}, path::Path};

use anyhow::{anyhow, bail, ensure, Context, Result};
use geo::Coord;
use tiff::{
    decoder::{Decoder, DecodingResult},
    encoder::{colortype::Gray32Float, TiffEncoder},
    tags::Tag,
};

use crate::raster::Raster;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GDAL_NODATA: u16 = 42113;

/// Resolve a GeoTIFF tag code to the decoder's tag, named or not.
#[inline]
fn geo_tag(code: u16) -> Tag { Tag::from_u16_exhaustive(code) }

/// Read the first band of a north-up GeoTIFF. Cells equal to the GDAL nodata value become NaN.
pub fn read_geotiff(path: &Path) -> Result<Raster> {
    let file = File::open(path)
        .with_context(|| format!("[raster::io] Failed to open raster {}", path.display()))?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .with_context(|| format!("[raster::io] Not a valid TIFF: {}", path.display()))?;

    let (width, height) = decoder.dimensions()
        .with_context(|| format!("[raster::io] Cannot read dimensions of {}", path.display()))?;

    let scale = decoder.get_tag_f64_vec(geo_tag(MODEL_PIXEL_SCALE))
        .with_context(|| format!("[raster::io] Missing pixel scale tag in {}", path.display()))?;
    let tiepoint = decoder.get_tag_f64_vec(geo_tag(MODEL_TIEPOINT))
        .with_context(|| format!("[raster::io] Missing tiepoint tag in {}", path.display()))?;
    ensure!(scale.len() >= 2 && tiepoint.len() >= 6,
        "[raster::io] Malformed georeferencing tags in {}", path.display());
    ensure!((scale[0] - scale[1]).abs() <= 1e-9 * scale[0].abs(),
        "[raster::io] Non-square cells ({} x {}) in {}", scale[0], scale[1], path.display());

    let nodata = decoder.get_tag_ascii_string(geo_tag(GDAL_NODATA)).ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse::<f64>().ok());

    let image = decoder.read_image()
        .with_context(|| format!("[raster::io] Cannot read image data of {}", path.display()))?;
    let mut values = decoded_to_f64(image)
        .ok_or_else(|| anyhow!("[raster::io] Unsupported pixel type in {}", path.display()))?;
    if let Some(nodata) = nodata {
        values.iter_mut().filter(|v| **v == nodata).for_each(|v| *v = f64::NAN);
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin = Coord {
        x: tiepoint[3] - tiepoint[0] * scale[0],
        y: tiepoint[4] + tiepoint[1] * scale[1],
    };
    Raster::from_vec(origin, scale[0], height as usize, width as usize, values)
        .with_context(|| format!("[raster::io] Bad raster layout in {}", path.display()))
}

/// Write a raster as a single-band 32-bit float GeoTIFF.
pub fn write_geotiff(raster: &Raster, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[raster::io] Failed to create raster {}", path.display()))?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file))?;
    let mut image = encoder.new_image::<Gray32Float>(raster.cols() as u32, raster.rows() as u32)?;

    let scale = [raster.cell_size(), raster.cell_size(), 0.0];
    let tiepoint = [0.0, 0.0, 0.0, raster.origin().x, raster.origin().y, 0.0];
    image.encoder().write_tag(geo_tag(MODEL_PIXEL_SCALE), &scale[..])?;
    image.encoder().write_tag(geo_tag(MODEL_TIEPOINT), &tiepoint[..])?;

    let data = raster.cells().iter().map(|&v| v as f32).collect::<Vec<_>>();
    if let Err(err) = image.write_data(&data) {
        bail!("[raster::io] Cannot write image data to {}: {err}", path.display());
    }
    Ok(())
}

fn decoded_to_f64(image: DecodingResult) -> Option<Vec<f64>> {
    let values = match image {
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        _ => return None,
    };
    Some(values)
}
