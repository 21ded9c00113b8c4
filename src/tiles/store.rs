use std::{collections::BTreeMap, fs, path::PathBuf, time::UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};

use crate::{common, raster::{read_geotiff, Raster}};

/// Read-only access to raster tiles by name, e.g. "SU_bhi.tif".
pub trait RasterStore: Send + Sync {
    /// Names of every raster in the store, sorted.
    fn names(&self) -> Result<Vec<String>>;
    fn load(&self, name: &str) -> Result<Raster>;
    /// Feed a summary of the stored rasters into a digest; it changes whenever a raster does.
    fn fingerprint(&self, hasher: &mut Sha256) -> Result<()>;
}

/// GeoTIFF files in one directory.
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }
}

impl RasterStore for DiskStore {
    fn names(&self) -> Result<Vec<String>> {
        Ok(common::list_files_with_ext(&self.root, &["tif", "tiff"])?
            .into_iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect())
    }

    fn load(&self, name: &str) -> Result<Raster> { read_geotiff(&self.root.join(name)) }

    /// Names, sizes and modification times; tile contents are not read.
    fn fingerprint(&self, hasher: &mut Sha256) -> Result<()> {
        for name in self.names()? {
            let meta = fs::metadata(self.root.join(&name))
                .with_context(|| format!("[tiles::store] Failed to stat {name}"))?;
            let modified = meta.modified().ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map_or(0, |d| d.as_nanos());
            common::digest_str(hasher, &name);
            hasher.update(meta.len().to_le_bytes());
            hasher.update(modified.to_le_bytes());
        }
        Ok(())
    }
}

/// Simple in-memory store.
#[derive(Default, Clone)]
pub struct MemStore {
    rasters: BTreeMap<String, Raster>,
}

impl MemStore {
    pub fn new(rasters: BTreeMap<String, Raster>) -> Self { Self { rasters } }

    pub fn insert(&mut self, name: impl Into<String>, raster: Raster) {
        self.rasters.insert(name.into(), raster);
    }
}

impl RasterStore for MemStore {
    fn names(&self) -> Result<Vec<String>> { Ok(self.rasters.keys().cloned().collect()) }

    fn load(&self, name: &str) -> Result<Raster> {
        self.rasters.get(name).cloned()
            .ok_or_else(|| anyhow!("missing raster tile: {name}"))
    }

    fn fingerprint(&self, hasher: &mut Sha256) -> Result<()> {
        for (name, raster) in &self.rasters {
            common::digest_str(hasher, name);
            raster.digest(hasher);
        }
        Ok(())
    }
}
