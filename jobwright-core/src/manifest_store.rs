//! Per-job YAML manifests.
//!
//! # Storage layout
//!
//! ```text
//! ~/.jobwright/
//!   config.yaml             (server connection: see `config`)
//!   jobs/
//!     <key>.yaml            (one manifest per job, mode 0600)
//! ```
//!
//! The key is the file stem and never changes; the job name inside the
//! manifest may, which is how renames are expressed.
//!
//! Every function takes the home directory explicitly; the CLI passes
//! `dirs::home_dir()`, tests pass a `TempDir`.

use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::types::JobManifest;

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.jobwright/jobs/`
///
/// Creates the directory (mode `0700`) if it does not yet exist.
pub fn jobs_dir_at(home: &Path) -> Result<PathBuf, StoreError> {
    let dir = home.join(".jobwright").join("jobs");
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_dir_permissions(&dir)?;
    }
    Ok(dir)
}

/// `<home>/.jobwright/jobs/<key>.yaml`: pure, no I/O.
pub fn manifest_path_at(home: &Path, key: &str) -> PathBuf {
    home.join(".jobwright")
        .join("jobs")
        .join(format!("{key}.yaml"))
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load the manifest stored under `key`.
///
/// Returns `StoreError::ManifestNotFound` if absent,
/// `StoreError::Parse` (with path + line context) if malformed YAML.
pub fn load_manifest_at(home: &Path, key: &str) -> Result<JobManifest, StoreError> {
    let path = manifest_path_at(home, key);
    if !path.exists() {
        return Err(StoreError::ManifestNotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| StoreError::Parse { path, source: e })
}

/// Load every manifest under `<home>/.jobwright/jobs/`, sorted by key.
///
/// Non-`.yaml` files (including `.yaml.tmp` leftovers) are skipped.
pub fn list_manifests_at(home: &Path) -> Result<Vec<(String, JobManifest)>, StoreError> {
    let dir = home.join(".jobwright").join("jobs");
    if !dir.exists() {
        return Ok(vec![]);
    }

    let mut entries: Vec<_> = std::fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut result = Vec::new();
    for entry in entries {
        let fname = entry.file_name();
        let fname = fname.to_string_lossy();
        let Some(key) = fname.strip_suffix(".yaml") else {
            continue;
        };
        let contents = std::fs::read_to_string(entry.path())?;
        let manifest: JobManifest = serde_yaml::from_str(&contents)
            .map_err(|e| StoreError::Parse { path: entry.path(), source: e })?;
        result.push((key.to_string(), manifest));
    }
    Ok(result)
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save a manifest to `<home>/.jobwright/jobs/<key>.yaml`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_manifest_at(home: &Path, key: &str, manifest: &JobManifest) -> Result<(), StoreError> {
    jobs_dir_at(home)?;
    let path = manifest_path_at(home, key);
    let tmp_path = path.with_file_name(format!("{key}.yaml.tmp"));

    let yaml = serde_yaml::to_string(manifest)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// 4. Init
// ---------------------------------------------------------------------------

/// Register a new manifest under `key` and return its path.
///
/// Never overwrites: an existing file is `StoreError::ManifestExists`.
pub fn init_at(home: &Path, key: &str, manifest: &JobManifest) -> Result<PathBuf, StoreError> {
    let path = manifest_path_at(home, key);
    if path.exists() {
        return Err(StoreError::ManifestExists { path });
    }
    save_manifest_at(home, key, manifest)?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
