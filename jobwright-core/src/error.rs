//! Error types for jobwright-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the manifest store (load / save / list).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse job manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `init` found a manifest already stored under the key.
    #[error("job manifest already exists at {path}")]
    ManifestExists { path: PathBuf },

    /// The manifest file did not exist at the expected path.
    #[error("job manifest not found at {path}")]
    ManifestNotFound { path: PathBuf },
}

/// Schema or enum violation in a job manifest or job definition model.
///
/// Raised once, at the boundary where user input becomes a typed model.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: unrecognized value {value:?}, expected one of {allowed:?}")]
    UnknownVariant {
        field: &'static str,
        value: String,
        allowed: &'static [&'static str],
    },

    #[error("{field}: required value is missing or empty")]
    MissingField { field: &'static str },

    #[error("{field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },

    /// Deserialization failure (unknown key, wrong type, missing sub-field).
    #[error("invalid job definition: {0}")]
    Schema(String),

    #[error("job manifest must set exactly one of `template` or `definition`")]
    AmbiguousSource,

    /// A template binding set next to a `definition`, which never reads it.
    #[error("`{field}` only applies to template jobs; set it inside `definition` instead")]
    DefinitionBinding { field: &'static str },
}

/// A template reference whose address cannot be resolved.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("malformed template URL {url:?}: {reason}")]
    MalformedUrl { url: String, reason: String },

    #[error("template reference {reference:?} names an empty file path")]
    EmptyPath { reference: String },
}

/// Errors while loading the Jenkins server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("no Jenkins server URL configured; set JENKINS_URL or server_url in {path}")]
    MissingServerUrl { path: PathBuf },

    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}
