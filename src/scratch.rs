use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::{NamedTempFile, TempDir};

use crate::{error::ZoneError, record::ZoneRecord};

const RECORD_FILE: &str = "record.json";
const RUN_FILE: &str = "run.sha256";
const SCOPE_PREFIX: &str = "zone_";

/// A run-scoped working directory. Each zone gets its own sub-scope, so workers never collide.
///
/// A temporary workspace is removed by [`ScratchWorkspace::close`] (or on drop); a
/// persistent one is kept, so a rerun can pick up the records of zones already measured.
#[derive(Debug)]
pub struct ScratchWorkspace {
    root: PathBuf,
    temp: Option<TempDir>,
}

impl ScratchWorkspace {
    /// A fresh temporary workspace.
    pub fn new() -> Result<Self, ZoneError> {
        let temp = tempfile::Builder::new()
            .prefix("beaver-zones-")
            .tempdir()
            .map_err(ZoneError::Scratch)?;
        Ok(Self { root: temp.path().to_path_buf(), temp: Some(temp) })
    }

    /// A workspace at a fixed path that is kept after the run.
    pub fn persistent(root: impl Into<PathBuf>) -> Result<Self, ZoneError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(ZoneError::Scratch)?;
        Ok(Self { root, temp: None })
    }

    #[inline] pub fn root(&self) -> &Path { &self.root }

    /// Bind the workspace to the run identified by `fingerprint`.
    ///
    /// Returns true when the workspace already belonged to that run, so its records may be
    /// reused. Otherwise every zone scope is removed before the fingerprint is recorded.
    pub fn claim(&self, fingerprint: &str) -> Result<bool, ZoneError> {
        let run_file = self.root.join(RUN_FILE);
        let previous = fs::read_to_string(&run_file).ok();
        if previous.as_deref().map(str::trim) == Some(fingerprint) { return Ok(true) }

        for entry in fs::read_dir(&self.root).map_err(ZoneError::Scratch)? {
            let path = entry.map_err(ZoneError::Scratch)?.path();
            if path.is_dir() && scope_zone_id(&path).is_some() {
                fs::remove_dir_all(&path).map_err(ZoneError::Scratch)?;
            }
        }
        write_atomic(&self.root, RUN_FILE, fingerprint.as_bytes()).map_err(ZoneError::Scratch)?;
        Ok(false)
    }

    /// The sub-scope of one zone, created on demand.
    pub fn scope(&self, zone_id: u32) -> Result<ZoneScope, ZoneError> {
        let dir = self.root.join(format!("{SCOPE_PREFIX}{zone_id:08}"));
        fs::create_dir_all(&dir).map_err(|source| ZoneError::Io { zone_id, source })?;
        Ok(ZoneScope { zone_id, dir })
    }

    /// Release the workspace. A cleanup failure is returned as a warning, never as an error.
    pub fn close(self) -> Option<String> {
        let temp = self.temp?;
        let path = temp.path().display().to_string();
        temp.close().err()
            .map(|err| format!("{} ({path})", ZoneError::Scratch(err)))
    }
}

/// One zone's private directory inside a [`ScratchWorkspace`].
#[derive(Debug, Clone)]
pub struct ZoneScope {
    zone_id: u32,
    dir: PathBuf,
}

impl ZoneScope {
    #[inline] pub fn zone_id(&self) -> u32 { self.zone_id }

    #[inline] pub fn dir(&self) -> &Path { &self.dir }

    /// Persist the zone's output record. The file is replaced whole or not at all.
    pub fn write_record(&self, record: &ZoneRecord) -> Result<(), ZoneError> {
        let bytes = serde_json::to_vec_pretty(record).map_err(|e| self.io_error(io::Error::other(e)))?;
        write_atomic(&self.dir, RECORD_FILE, &bytes).map_err(|e| self.io_error(e))
    }

    /// The record left by an earlier run, if any. An unreadable record is an error.
    pub fn read_record(&self) -> Result<Option<ZoneRecord>, ZoneError> {
        let path = self.dir.join(RECORD_FILE);
        if !path.is_file() { return Ok(None) }
        read_record(&path).map(Some).map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: io::Error) -> ZoneError {
        ZoneError::Io { zone_id: self.zone_id, source }
    }
}

/// Write `name` in `dir` through a temporary file renamed into place.
fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> io::Result<()> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(dir.join(name)).map_err(|e| e.error)?;
    Ok(())
}

/// Zone of a scope directory, parsed from its name.
pub(crate) fn scope_zone_id(dir: &Path) -> Option<u32> {
    dir.file_name()?.to_str()?.strip_prefix(SCOPE_PREFIX)?.parse().ok()
}

/// Read one serialized record.
pub(crate) fn read_record(path: &Path) -> io::Result<ZoneRecord> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(io::Error::other)
}

/// Whether a path names a serialized zone record.
pub(crate) fn is_record_file(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == RECORD_FILE)
}
