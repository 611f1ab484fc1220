//! Error types for jobwright-sync.

use std::path::PathBuf;

use thiserror::Error;

use jobwright_core::error::{StoreError, ValidationError};
use jobwright_core::JobName;
use jobwright_renderer::RenderError;

/// Failure reported by a [`JobRegistry`](crate::client::JobRegistry)
/// implementation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Anything else (unexpected payload, client-side bug).
    #[error("{0}")]
    Other(String),
}

/// All errors that can arise from reconciliation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Resolving, binding or synthesizing the document failed.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Manifest store failure.
    #[error("manifest store error: {0}")]
    Store(#[from] StoreError),

    /// The manifest does not describe a valid desired state.
    #[error("invalid job manifest: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to create job {job}: {source}")]
    Create {
        job: JobName,
        #[source]
        source: ClientError,
    },

    #[error("failed to update job {job}: {source}")]
    Update {
        job: JobName,
        #[source]
        source: ClientError,
    },

    #[error("failed to delete job {job}: {source}")]
    Delete {
        job: JobName,
        #[source]
        source: ClientError,
    },

    #[error("failed to rename job {from} to {to}: {source}")]
    Rename {
        from: JobName,
        to: JobName,
        #[source]
        source: ClientError,
    },

    #[error("failed to read job {job}: {source}")]
    Read {
        job: JobName,
        #[source]
        source: ClientError,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (state store).
    #[error("state store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
