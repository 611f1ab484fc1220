//! Applied-state store: the host's memory of what was pushed to the registry.
//!
//! Persists one [`AppliedJob`] JSON document per manifest key at
//! `<home>/.jobwright/state/<key>.json`. Writes use the same atomic `.tmp` +
//! rename pattern as the manifest store.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jobwright_core::{JobParameters, JobRecord};

use crate::error::{io_err, SyncError};

/// On-disk applied state of one job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppliedJob {
    pub applied_at: DateTime<Utc>,
    pub record: JobRecord,
    /// Parameters the current remote document was bound with.
    pub parameters: JobParameters,
}

impl AppliedJob {
    pub fn now(record: JobRecord, parameters: JobParameters) -> Self {
        AppliedJob {
            applied_at: Utc::now(),
            record,
            parameters,
        }
    }
}

pub fn state_dir_at(home: &Path) -> PathBuf {
    home.join(".jobwright").join("state")
}

/// `~/.jobwright/state/<key>.json`
pub fn state_path_at(home: &Path, key: &str) -> PathBuf {
    state_dir_at(home).join(format!("{key}.json"))
}

/// Load the applied state for `key`; `None` if the job was never applied.
pub fn load_at(home: &Path, key: &str) -> Result<Option<AppliedJob>, SyncError> {
    let path = state_path_at(home, key);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(Some(serde_json::from_str(&contents)?))
}

/// Save the applied state for `key` atomically.
pub fn save_at(home: &Path, key: &str, state: &AppliedJob) -> Result<(), SyncError> {
    let dir = state_dir_at(home);
    std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

    let path = state_path_at(home, key);
    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    Ok(())
}

/// Forget `key`. Removing state that does not exist is not an error.
pub fn remove_at(home: &Path, key: &str) -> Result<(), SyncError> {
    let path = state_path_at(home, key);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_err(&path, e)),
    }
}
