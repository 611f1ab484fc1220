//! Reconciler: converges one registry job towards its desired state.
//!
//! Each job is either absent from the registry or present with a recorded
//! template hash ([`JobRecord`]). The reconciler holds no state of its own;
//! the record is owned by the host and passed in on every call.
//!
//! ## `update` protocol
//!
//! 1. Resolve and hash the desired source; bind (or synthesize) the document
//!    unless [`Fingerprint::is_unchanged`] holds for the record.
//! 2. Rename the remote job if the desired name differs from the record.
//! 3. Push the document, if one was bound.
//!
//! Content is evaluated before the rename rather than after it, so a template
//! that fails to resolve or bind leaves the job under its old name and no
//! registry call is made. The rename still lands before the document push.
//!
//! [`Fingerprint::is_unchanged`]: crate::document::Fingerprint::is_unchanged

use jobwright_core::{DesiredJob, JobName, JobRecord};

use crate::client::{JobHandle, JobRegistry};
use crate::document::{DocumentBuilder, Rendered};
use crate::error::SyncError;

/// What `update` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub record: JobRecord,
    pub renamed_from: Option<JobName>,
    pub document_updated: bool,
}

impl UpdateOutcome {
    pub fn is_noop(&self) -> bool {
        self.renamed_from.is_none() && !self.document_updated
    }
}

/// Dry-run decision for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Create,
    Unchanged,
    Update {
        rename_from: Option<JobName>,
        document: bool,
    },
}

pub struct Reconciler<'a, R: JobRegistry + ?Sized> {
    registry: &'a R,
    builder: DocumentBuilder,
}

impl<'a, R: JobRegistry + ?Sized> Reconciler<'a, R> {
    pub fn new(registry: &'a R) -> Self {
        Reconciler {
            registry,
            builder: DocumentBuilder::new(),
        }
    }

    pub fn with_builder(registry: &'a R, builder: DocumentBuilder) -> Self {
        Reconciler { registry, builder }
    }

    pub fn builder(&self) -> &DocumentBuilder {
        &self.builder
    }

    /// Render `desired` and create it on the registry.
    ///
    /// Nothing is recorded unless the registry accepted the job.
    pub fn create(&self, desired: &DesiredJob) -> Result<JobRecord, SyncError> {
        let rendered = self.builder.render(desired)?;
        let handle = self
            .registry
            .create(desired.name(), &rendered.document)
            .map_err(|source| SyncError::Create {
                job: desired.name().clone(),
                source,
            })?;
        tracing::info!("created job {}", handle.name());
        Ok(rendered.fingerprint.record(handle.name().clone()))
    }

    /// `Some(record)` while the job still exists, `None` once it has been
    /// deleted out of band.
    pub fn read(&self, record: &JobRecord) -> Result<Option<JobRecord>, SyncError> {
        if self.exists(&record.id)? {
            Ok(Some(record.clone()))
        } else {
            tracing::debug!("job {} is gone from the registry", record.id);
            Ok(None)
        }
    }

    pub fn exists(&self, name: &JobName) -> Result<bool, SyncError> {
        self.registry.exists(name).map_err(|source| SyncError::Read {
            job: name.clone(),
            source,
        })
    }

    pub fn update(&self, desired: &DesiredJob, record: &JobRecord) -> Result<UpdateOutcome, SyncError> {
        let fingerprint = self.builder.fingerprint(desired)?;
        let rendered = if fingerprint.is_unchanged(record) {
            None
        } else {
            Some(self.builder.bind(desired, &fingerprint)?)
        };

        let mut handle = JobHandle::new(record.id.clone());
        let mut renamed_from = None;
        if desired.name() != &record.id {
            handle = self
                .registry
                .rename(&handle, desired.name())
                .map_err(|source| SyncError::Rename {
                    from: record.id.clone(),
                    to: desired.name().clone(),
                    source,
                })?;
            tracing::info!("renamed job {} to {}", record.id, handle.name());
            renamed_from = Some(record.id.clone());
        }

        let Some(Rendered {
            document,
            fingerprint,
        }) = rendered
        else {
            tracing::debug!("job {} unchanged ({})", handle.name(), fingerprint.hash());
            return Ok(UpdateOutcome {
                record: JobRecord {
                    id: handle.name().clone(),
                    ..record.clone()
                },
                renamed_from,
                document_updated: false,
            });
        };

        self.registry
            .update(&handle, &document)
            .map_err(|source| SyncError::Update {
                job: handle.name().clone(),
                source,
            })?;
        tracing::info!(
            "updated job {} ({} -> {})",
            handle.name(),
            record.template_hash,
            fingerprint.hash()
        );
        Ok(UpdateOutcome {
            record: fingerprint.record(handle.name().clone()),
            renamed_from,
            document_updated: true,
        })
    }

    pub fn delete(&self, record: &JobRecord) -> Result<(), SyncError> {
        self.registry
            .delete(&record.id)
            .map_err(|source| SyncError::Delete {
                job: record.id.clone(),
                source,
            })?;
        tracing::info!("deleted job {}", record.id);
        Ok(())
    }

    /// Delete the recorded job and create `desired` from scratch.
    pub fn replace(&self, desired: &DesiredJob, record: &JobRecord) -> Result<JobRecord, SyncError> {
        self.delete(record)?;
        self.create(desired)
    }

    /// Decide what `create`/`update` would do without touching the registry.
    pub fn plan(&self, desired: &DesiredJob, record: Option<&JobRecord>) -> Result<Plan, SyncError> {
        plan(&self.builder, desired, record)
    }
}

/// Decide what `create`/`update` would do. Needs no registry at all.
pub fn plan(
    builder: &DocumentBuilder,
    desired: &DesiredJob,
    record: Option<&JobRecord>,
) -> Result<Plan, SyncError> {
    let Some(record) = record else {
        // Surfaces resolve and render errors the real create would hit.
        builder.render(desired)?;
        return Ok(Plan::Create);
    };
    let fingerprint = builder.fingerprint(desired)?;
    let rename_from = (desired.name() != &record.id).then(|| record.id.clone());
    let document = !fingerprint.is_unchanged(record);
    if document {
        builder.bind(desired, &fingerprint)?;
    }
    Ok(match (rename_from, document) {
        (None, false) => Plan::Unchanged,
        (rename_from, document) => Plan::Update {
            rename_from,
            document,
        },
    })
}
