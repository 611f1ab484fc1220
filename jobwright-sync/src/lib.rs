//! # jobwright-sync
//!
//! Reconciliation of desired jobs against a Jenkins-style job registry.
//!
//! [`Reconciler`] implements create / read / update / delete for one job
//! given the host's [`JobRecord`](jobwright_core::JobRecord). The
//! [`pipeline`] module wires it to the manifest store and the applied-state
//! store; [`status`] answers "what would change" without touching the
//! registry.

pub mod client;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod reconciler;
pub mod state_store;
pub mod status;

pub use client::{JobHandle, JobRegistry, JobSnapshot};
pub use document::{DocumentBuilder, Fingerprint, Rendered};
pub use error::{ClientError, SyncError};
pub use pipeline::{ApplyAction, ApplyResult, ApplyScope};
pub use reconciler::{Plan, Reconciler, UpdateOutcome};
pub use state_store::AppliedJob;
pub use status::{JobStatus, StatusReport};
