//! Error types for jobwright-renderer.

use std::path::PathBuf;

use thiserror::Error;

use jobwright_core::{ReferenceError, ValidationError};

/// All errors that can arise while turning desired state into a document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The template reference does not name a usable address.
    #[error("invalid template address: {0}")]
    Address(#[from] ReferenceError),

    /// Reading the template from the network or the filesystem failed.
    #[error("failed to fetch template from {location}: {source}")]
    Fetch {
        location: String,
        #[source]
        source: FetchError,
    },

    /// The template text does not parse.
    #[error("template syntax error: {0}")]
    TemplateSyntax(#[source] tera::Error),

    /// The template parsed but could not be executed against the bindings.
    #[error("template execution error: {0}")]
    TemplateExecution(#[source] tera::Error),

    /// The job definition model is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Underlying cause of a [`RenderError::Fetch`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("server answered HTTP {status}")]
    Status { status: u16 },

    #[error("transport error: {0}")]
    Transport(#[source] Box<ureq::Transport>),

    #[error("error reading response body: {0}")]
    Body(#[source] std::io::Error),
}

pub(crate) fn fetch_err(location: impl Into<String>, source: FetchError) -> RenderError {
    RenderError::Fetch {
        location: location.into(),
        source,
    }
}
