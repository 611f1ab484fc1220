//! jobwright core library: domain types, template references, the job
//! definition model, manifest persistence, server configuration, errors.
//!
//! - [`types`]: newtypes, job parameters, records, manifests
//! - [`reference`]: template reference parsing
//! - [`model`]: typed job definition model
//! - [`manifest_store`]: load / save / list manifests
//! - [`config`]: Jenkins server connection settings
//! - [`error`]: error enums

pub mod config;
pub mod error;
pub mod manifest_store;
pub mod model;
pub mod reference;
pub mod types;

pub use config::ServerConfig;
pub use error::{ConfigError, ReferenceError, StoreError, ValidationError};
pub use model::{JobDefinitionModel, Period, Threshold};
pub use reference::{TemplateAddress, TemplateReference};
pub use types::{DesiredJob, JobManifest, JobName, JobParameters, JobRecord, JobSource};
