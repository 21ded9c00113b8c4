use ahash::AHashMap;
use sha2::{Digest, Sha256};

use crate::common;

/// Raster names keyed by their fixed-length tile prefix (e.g. "SU" for "SU_bhi.tif").
#[derive(Debug, Clone, Default)]
pub struct TileCatalog {
    prefix_len: usize,
    by_prefix: AHashMap<String, Vec<String>>,
}

impl TileCatalog {
    /// Index `names` by their first `prefix_len` characters (ASCII case-insensitive).
    /// Names shorter than the prefix are ignored.
    pub fn new(names: impl IntoIterator<Item = String>, prefix_len: usize) -> Self {
        let mut by_prefix: AHashMap<String, Vec<String>> = AHashMap::new();
        for name in names {
            if let Some(prefix) = name.get(..prefix_len) {
                by_prefix.entry(prefix.to_ascii_uppercase()).or_default().push(name);
            }
        }
        for rasters in by_prefix.values_mut() { rasters.sort() }
        Self { prefix_len, by_prefix }
    }

    #[inline] pub fn prefix_len(&self) -> usize { self.prefix_len }

    /// Number of rasters in the catalog.
    pub fn len(&self) -> usize { self.by_prefix.values().map(Vec::len).sum() }

    pub fn is_empty(&self) -> bool { self.by_prefix.is_empty() }

    /// Feed the prefix length and every raster name, in sorted order, into a digest.
    pub(crate) fn digest(&self, hasher: &mut Sha256) {
        hasher.update((self.prefix_len as u64).to_le_bytes());
        let mut names = self.by_prefix.values().flatten().collect::<Vec<_>>();
        names.sort();
        for name in names { common::digest_str(hasher, name) }
    }

    /// Rasters belonging to any of the given tile names, in tile order.
    pub fn select<'a>(&'a self, tiles: &[&str]) -> Vec<&'a str> {
        tiles.iter()
            .filter_map(|tile| self.by_prefix.get(&tile.to_ascii_uppercase()))
            .flatten()
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TileCatalog {
        TileCatalog::new(
            ["SU_bhi.tif", "st_bhi.tif", "NT_bhi.tif", "S"].map(String::from),
            2,
        )
    }

    #[test]
    fn selects_by_prefix() {
        let c = catalog();
        assert_eq!(c.len(), 3);
        assert_eq!(c.select(&["ST", "SU"]), vec!["st_bhi.tif", "SU_bhi.tif"]);
        assert_eq!(c.select(&["NT"]), vec!["NT_bhi.tif"]);
    }

    #[test]
    fn unknown_tiles_select_nothing() {
        assert!(catalog().select(&["HP", "SV"]).is_empty());
        assert!(catalog().select(&[]).is_empty());
    }

    #[test]
    fn digest_ignores_insertion_order() {
        let digest = |c: &TileCatalog| common::sha256_hex(|h| c.digest(h));
        let reversed = TileCatalog::new(["S", "NT_bhi.tif", "st_bhi.tif", "SU_bhi.tif"].map(String::from), 2);
        assert_eq!(digest(&catalog()), digest(&reversed));
        assert_ne!(digest(&catalog()), digest(&TileCatalog::new(["SU_bhi.tif"].map(String::from), 2)));
    }

    #[test]
    fn several_rasters_per_tile() {
        let c = TileCatalog::new(["SUa.tif", "SUb.tif"].map(String::from), 2);
        assert_eq!(c.select(&["SU"]), vec!["SUa.tif", "SUb.tif"]);
    }
}
