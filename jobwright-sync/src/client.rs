//! The job registry boundary.
//!
//! [`JobRegistry`] is everything the reconciler needs from a Jenkins server.
//! The CLI ships an HTTP implementation; tests use in-memory fakes.

use jobwright_core::JobName;

use crate::error::ClientError;

/// Opaque reference to a job that exists on the registry.
///
/// Built from the job name alone, so callers holding a record can address
/// the job without a lookup round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    name: JobName,
}

impl JobHandle {
    pub fn new(name: impl Into<JobName>) -> Self {
        JobHandle { name: name.into() }
    }

    pub fn name(&self) -> &JobName {
        &self.name
    }
}

/// What the registry reports about an existing job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobSnapshot {
    pub name: String,
    pub display_name: Option<String>,
    pub url: Option<String>,
    pub disabled: bool,
}

pub trait JobRegistry {
    fn exists(&self, name: &JobName) -> Result<bool, ClientError>;

    fn get(&self, name: &JobName) -> Result<Option<JobSnapshot>, ClientError>;

    fn create(&self, name: &JobName, document: &str) -> Result<JobHandle, ClientError>;

    fn update(&self, handle: &JobHandle, document: &str) -> Result<(), ClientError>;

    fn rename(&self, handle: &JobHandle, new_name: &JobName) -> Result<JobHandle, ClientError>;

    fn delete(&self, name: &JobName) -> Result<(), ClientError>;
}
