//! JSON persistence for manifests: tolerant load, atomic save.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix of the scratch file written before the atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Reads and parses `path`. A missing file yields `None`; a present but
/// unparsable file is an error so it is never overwritten by an empty one.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read manifest: {}", path.display())),
    };
    let value = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse manifest: {}", path.display()))?;
    Ok(Some(value))
}

/// Writes `value` as pretty JSON to `<path>.part`, syncs it, then renames it over `path`.
/// Readers see either the previous complete file or the new one.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir: {}", parent.display()))?;
    }
    let json = serde_json::to_vec_pretty(value).context("serialize manifest")?;
    let temp = temp_path(path);
    {
        let mut file = std::fs::File::create(&temp)
            .with_context(|| format!("create {}", temp.display()))?;
        file.write_all(&json)
            .with_context(|| format!("write {}", temp.display()))?;
        file.sync_all()
            .with_context(|| format!("sync {}", temp.display()))?;
    }
    std::fs::rename(&temp, path).with_context(|| {
        format!("failed to rename {} to {}", temp.display(), path.display())
    })?;
    Ok(())
}
