//! Offline drift check: manifest vs. applied state, no registry calls.
//!
//! Signal precedence:
//! 1. `NeverApplied` (no applied state for the key)
//! 2. `Renamed` (manifest name differs from the recorded job)
//! 3. `Rebind` (description, display name, disabled flag or parameters changed)
//! 4. `Drifted` (template or definition hash changed, or suffix mismatch)
//! 5. `Current`

use std::path::Path;

use chrono::{DateTime, Utc};

use jobwright_core::{manifest_store, JobName};

use crate::document::DocumentBuilder;
use crate::state_store::{self, AppliedJob};
use crate::SyncError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    NeverApplied,
    Current,
    Renamed { from: JobName, to: JobName },
    Rebind,
    Drifted { stored: String, fresh: String },
}

impl JobStatus {
    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::NeverApplied => "never applied",
            JobStatus::Current => "current",
            JobStatus::Renamed { .. } => "renamed",
            JobStatus::Rebind => "rebind",
            JobStatus::Drifted { .. } => "drifted",
        }
    }
}

/// Status of one manifest key together with its applied state, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub key: String,
    pub job: JobName,
    pub status: JobStatus,
    pub applied: Option<AppliedJob>,
}

/// Classify `key` by comparing its manifest with the applied state.
pub fn check(home: &Path, builder: &DocumentBuilder, key: &str) -> Result<StatusReport, SyncError> {
    let manifest = manifest_store::load_manifest_at(home, key)?;
    let desired = manifest.desired()?;
    let applied = state_store::load_at(home, key)?;

    let status = match &applied {
        None => JobStatus::NeverApplied,
        Some(state) if &state.record.id != desired.name() => JobStatus::Renamed {
            from: state.record.id.clone(),
            to: desired.name().clone(),
        },
        Some(state) if desired.rebinds(&state.parameters) => JobStatus::Rebind,
        Some(state) => {
            let fingerprint = builder.fingerprint(&desired)?;
            if fingerprint.is_unchanged(&state.record) {
                JobStatus::Current
            } else {
                JobStatus::Drifted {
                    stored: state.record.template_hash.clone(),
                    fresh: fingerprint.hash().to_string(),
                }
            }
        }
    };

    Ok(StatusReport {
        key: key.to_string(),
        job: desired.name().clone(),
        status,
        applied,
    })
}

/// Status of every manifest, sorted by key.
pub fn check_all(home: &Path, builder: &DocumentBuilder) -> Result<Vec<StatusReport>, SyncError> {
    manifest_store::list_manifests_at(home)?
        .into_iter()
        .map(|(key, _)| check(home, builder, &key))
        .collect()
}

/// Format age from a chrono timestamp (`applied_at`).
pub fn format_datetime_age(timestamp: DateTime<Utc>) -> String {
    let now = Utc::now();
    let age = now.signed_duration_since(timestamp).num_seconds().max(0) as u64;
    format_seconds(age)
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobwright_core::{JobManifest, JobRecord, TemplateReference};
    use jobwright_renderer::content_hash;
    use tempfile::TempDir;

    fn setup(template: &str) -> TempDir {
        let home = TempDir::new().expect("home");
        let manifest = JobManifest::with_template("api-build", TemplateReference::new(template));
        manifest_store::save_manifest_at(home.path(), "api", &manifest).expect("save");
        home
    }

    fn apply(home: &Path, name: &str, hash: String) {
        let state = AppliedJob::now(
            JobRecord::new(name, hash),
            jobwright_core::JobParameters::new(name),
        );
        state_store::save_at(home, "api", &state).expect("save state");
    }

    #[test]
    fn never_applied_without_state() {
        let home = setup("<project/>");
        let report = check(home.path(), &DocumentBuilder::new(), "api").unwrap();
        assert_eq!(report.status, JobStatus::NeverApplied);
        assert_eq!(report.job, JobName::from("api-build"));
    }

    #[test]
    fn current_when_hash_matches() {
        let home = setup("<project/>");
        apply(home.path(), "api-build", content_hash(b"<project/>"));
        let report = check(home.path(), &DocumentBuilder::new(), "api").unwrap();
        assert_eq!(report.status, JobStatus::Current);
        assert!(report.applied.is_some());
    }

    #[test]
    fn drifted_when_template_changes() {
        let home = setup("<project>v2</project>");
        apply(home.path(), "api-build", content_hash(b"<project>v1</project>"));
        let report = check(home.path(), &DocumentBuilder::new(), "api").unwrap();
        assert!(matches!(report.status, JobStatus::Drifted { .. }), "{:?}", report.status);
    }

    #[test]
    fn renamed_takes_precedence_over_drift() {
        let home = setup("<project>v2</project>");
        apply(home.path(), "old-name", "stale".into());
        let report = check(home.path(), &DocumentBuilder::new(), "api").unwrap();
        assert_eq!(
            report.status,
            JobStatus::Renamed {
                from: "old-name".into(),
                to: "api-build".into()
            }
        );
    }

    #[test]
    fn rebind_when_parameters_change() {
        let home = setup("<project/>");
        apply(home.path(), "api-build", content_hash(b"<project/>"));
        let mut manifest = manifest_store::load_manifest_at(home.path(), "api").unwrap();
        manifest.parameters.insert("branch".into(), "develop".into());
        manifest_store::save_manifest_at(home.path(), "api", &manifest).unwrap();
        let report = check(home.path(), &DocumentBuilder::new(), "api").unwrap();
        assert_eq!(report.status, JobStatus::Rebind);
    }

    #[test]
    fn ages_are_compact() {
        assert_eq!(format_seconds(5), "5s");
        assert_eq!(format_seconds(120), "2m");
        assert_eq!(format_seconds(3 * 3600), "3h");
        assert_eq!(format_seconds(2 * 86400), "2d");
    }
}
