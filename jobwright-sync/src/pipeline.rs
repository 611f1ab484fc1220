//! Shared apply pipeline used by the CLI: manifest → reconciler → state.
//!
//! For each manifest key:
//! 1. Load and validate the manifest.
//! 2. Load the applied state; none means create.
//! 3. `read` the recorded job; gone means recreate.
//! 4. Changed template bindings other than the name mean replace
//!    (delete + create).
//! 5. Otherwise `update` (rename and/or push the document, or no-op).
//! 6. Persist the new record. Failures leave the previous state untouched.
//!
//! [`plan`] walks the same manifests offline and never needs a registry.

use std::path::Path;

use jobwright_core::{manifest_store, DesiredJob, JobName, JobRecord};

use crate::client::JobRegistry;
use crate::document::DocumentBuilder;
use crate::reconciler::{self, Plan, Reconciler};
use crate::state_store::{self, AppliedJob};
use crate::SyncError;

/// Scope for an apply run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyScope {
    /// Apply every manifest.
    All,
    /// Apply a single manifest key.
    Job(String),
}

/// What happened to one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyAction {
    Created,
    /// The recorded job was deleted out of band and has been created again.
    Recreated,
    /// Non-name bindings changed; the job was deleted and created.
    Replaced,
    Updated {
        renamed_from: Option<JobName>,
        document_updated: bool,
    },
    Unchanged,
    /// `--dry-run`: what `update`/`create` would do.
    Planned(Plan),
    /// `--dry-run`: bindings changed, a replace would run.
    WouldReplace,
}

impl ApplyAction {
    pub fn label(&self) -> String {
        match self {
            ApplyAction::Created => "created".to_string(),
            ApplyAction::Recreated => "recreated".to_string(),
            ApplyAction::Replaced => "replaced".to_string(),
            ApplyAction::Updated {
                renamed_from: Some(from),
                document_updated: true,
            } => format!("renamed from {from}, updated"),
            ApplyAction::Updated {
                renamed_from: Some(from),
                document_updated: false,
            } => format!("renamed from {from}"),
            ApplyAction::Updated { .. } => "updated".to_string(),
            ApplyAction::Unchanged => "unchanged".to_string(),
            ApplyAction::Planned(Plan::Create) => "would create".to_string(),
            ApplyAction::Planned(Plan::Unchanged) => "unchanged".to_string(),
            ApplyAction::Planned(Plan::Update {
                rename_from,
                document,
            }) => match (rename_from, document) {
                (Some(from), true) => format!("would rename from {from} and update"),
                (Some(from), false) => format!("would rename from {from}"),
                (None, _) => "would update".to_string(),
            },
            ApplyAction::WouldReplace => "would replace".to_string(),
        }
    }
}

/// Outcome of applying one manifest key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub key: String,
    pub job: JobName,
    pub action: ApplyAction,
    /// Hash now recorded for the job. `None` on dry runs.
    pub template_hash: Option<String>,
}

/// Run the apply pipeline for a scope.
pub fn run<R: JobRegistry + ?Sized>(
    home: &Path,
    reconciler: &Reconciler<'_, R>,
    scope: ApplyScope,
) -> Result<Vec<ApplyResult>, SyncError> {
    match scope {
        ApplyScope::All => manifest_store::list_manifests_at(home)?
            .into_iter()
            .map(|(key, _)| apply_job(home, reconciler, &key))
            .collect(),
        ApplyScope::Job(key) => Ok(vec![apply_job(home, reconciler, &key)?]),
    }
}

/// Dry run: what [`run`] would do, decided from recorded state alone.
pub fn plan(
    home: &Path,
    builder: &DocumentBuilder,
    scope: ApplyScope,
) -> Result<Vec<ApplyResult>, SyncError> {
    match scope {
        ApplyScope::All => manifest_store::list_manifests_at(home)?
            .into_iter()
            .map(|(key, _)| plan_job(home, builder, &key))
            .collect(),
        ApplyScope::Job(key) => Ok(vec![plan_job(home, builder, &key)?]),
    }
}

/// Apply one manifest key.
pub fn apply_job<R: JobRegistry + ?Sized>(
    home: &Path,
    reconciler: &Reconciler<'_, R>,
    key: &str,
) -> Result<ApplyResult, SyncError> {
    let manifest = manifest_store::load_manifest_at(home, key)?;
    let desired = manifest.desired()?;
    let applied = state_store::load_at(home, key)?;

    let (record, action) = match applied {
        None => (reconciler.create(&desired)?, ApplyAction::Created),
        Some(applied) => match locate(reconciler, &desired, &applied.record)? {
            None => {
                tracing::info!("job {} no longer exists; recreating", applied.record.id);
                (reconciler.create(&desired)?, ApplyAction::Recreated)
            }
            Some(record) if desired.rebinds(&applied.parameters) => {
                (reconciler.replace(&desired, &record)?, ApplyAction::Replaced)
            }
            Some(record) => {
                let outcome = reconciler.update(&desired, &record)?;
                if outcome.is_noop() && record == applied.record {
                    return Ok(ApplyResult {
                        key: key.to_string(),
                        job: record.id.clone(),
                        action: ApplyAction::Unchanged,
                        template_hash: Some(record.template_hash),
                    });
                }
                let action = if outcome.is_noop() {
                    ApplyAction::Unchanged
                } else {
                    ApplyAction::Updated {
                        renamed_from: outcome.renamed_from,
                        document_updated: outcome.document_updated,
                    }
                };
                (outcome.record, action)
            }
        },
    };

    state_store::save_at(
        home,
        key,
        &AppliedJob::now(record.clone(), desired.parameters.clone()),
    )?;
    Ok(ApplyResult {
        key: key.to_string(),
        job: record.id,
        action,
        template_hash: Some(record.template_hash),
    })
}

/// `read` the recorded job. When it is gone but a job with the desired name
/// exists (a rename landed and the following update failed), adopt that job
/// under the old hash so the next `update` pushes the document again.
fn locate<R: JobRegistry + ?Sized>(
    reconciler: &Reconciler<'_, R>,
    desired: &DesiredJob,
    record: &JobRecord,
) -> Result<Option<JobRecord>, SyncError> {
    if let Some(found) = reconciler.read(record)? {
        return Ok(Some(found));
    }
    if desired.name() != &record.id && reconciler.exists(desired.name())? {
        tracing::debug!("adopting {} as the renamed {}", desired.name(), record.id);
        return Ok(Some(JobRecord {
            id: desired.name().clone(),
            ..record.clone()
        }));
    }
    Ok(None)
}

fn plan_job(home: &Path, builder: &DocumentBuilder, key: &str) -> Result<ApplyResult, SyncError> {
    let manifest = manifest_store::load_manifest_at(home, key)?;
    let desired = manifest.desired()?;
    let applied = state_store::load_at(home, key)?;

    let action = match &applied {
        Some(state) if desired.rebinds(&state.parameters) => {
            builder.render(&desired)?;
            ApplyAction::WouldReplace
        }
        _ => ApplyAction::Planned(reconciler::plan(
            builder,
            &desired,
            applied.as_ref().map(|s| &s.record),
        )?),
    };
    tracing::info!("[dry-run] {key}: {}", action.label());
    Ok(ApplyResult {
        key: key.to_string(),
        job: desired.name().clone(),
        action,
        template_hash: None,
    })
}

/// Delete the job recorded for `key` and forget its state.
///
/// Returns the deleted record, or `None` when `key` was never applied. A job
/// already gone from the registry is not an error.
pub fn destroy<R: JobRegistry + ?Sized>(
    home: &Path,
    reconciler: &Reconciler<'_, R>,
    key: &str,
) -> Result<Option<JobRecord>, SyncError> {
    let Some(applied) = state_store::load_at(home, key)? else {
        return Ok(None);
    };
    if reconciler.read(&applied.record)?.is_some() {
        reconciler.delete(&applied.record)?;
    }
    state_store::remove_at(home, key)?;
    Ok(Some(applied.record))
}
