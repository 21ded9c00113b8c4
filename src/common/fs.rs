use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

/// Error unless the directory already exists.
pub(crate) fn require_dir_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("Directory does not exist: {}", path.display());
    }
    if !path.is_dir() {
        bail!("Path exists but is not a directory: {}", path.display());
    }
    Ok(())
}

/// Error unless the file already exists.
pub(crate) fn require_file_exists(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("File does not exist: {}", path.display());
    }
    Ok(())
}

/// Refuse to clobber an existing output unless `force` is set; removes it when forced.
pub(crate) fn prepare_output_file(path: &Path, force: bool) -> Result<()> {
    if path.exists() {
        if !force {
            bail!("Output already exists (use --force to overwrite): {}", path.display());
        }
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove existing output {}", path.display()))?;
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// List the files directly inside `dir` whose extension matches one of `exts`
/// (case-insensitive), sorted by path.
pub(crate) fn list_files_with_ext(dir: &Path, exts: &[&str]) -> Result<Vec<PathBuf>> {
    require_dir_exists(dir)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to list directory {}", dir.display()))?;
        if !entry.file_type().is_file() { continue }

        let matches = entry.path().extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| exts.iter().any(|x| x.eq_ignore_ascii_case(e)));
        if matches {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_matching_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["SU_bhi.tif", "NT_bhi.TIFF", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.tif")).unwrap();

        let files = list_files_with_ext(dir.path(), &["tif", "tiff"]).unwrap();
        let names = files.iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["NT_bhi.TIFF", "SU_bhi.tif"]);
    }

    #[test]
    fn prepare_output_refuses_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("zones.csv");
        std::fs::write(&out, b"old").unwrap();

        assert!(prepare_output_file(&out, false).is_err());
        prepare_output_file(&out, true).unwrap();
        assert!(!out.exists());
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(require_dir_exists(&dir.path().join("absent")).is_err());
        assert!(require_dir_exists(dir.path()).is_ok());
    }
}
