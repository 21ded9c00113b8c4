use anyhow::{bail, Result};

/// Something that can be assembled from several parts of the same kind
/// (raster tiles into a mosaic, line networks into one network, per-zone tables into one).
pub trait Combine: Sized {
    /// Merge two or more parts. Never called with fewer than two.
    fn combine_many(parts: Vec<Self>) -> Result<Self>;
}

/// Combine a collection into one value. A single part passes through untouched;
/// an empty collection is an error.
pub fn combine<T: Combine>(mut parts: Vec<T>) -> Result<T> {
    match parts.len() {
        0 => bail!("[combine] nothing to combine"),
        1 => Ok(parts.remove(0)),
        _ => T::combine_many(parts),
    }
}
