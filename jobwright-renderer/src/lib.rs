//! # jobwright-renderer
//!
//! Turns desired job state into a Jenkins `config.xml`.
//!
//! - [`source`] resolves a template reference (inline, `file://`, HTTP)
//! - [`hash`] computes the content digest used for drift detection
//! - [`binder`] executes a Tera template against job parameters
//! - [`synth`] builds a pipeline document from a typed definition model
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jobwright_core::{JobParameters, TemplateReference};
//! use jobwright_renderer::{ParameterBinder, SourceResolver};
//!
//! fn render(reference: &TemplateReference, params: &JobParameters) {
//!     let resolver = SourceResolver::new();
//!     if let Ok(resolved) = resolver.resolve(reference) {
//!         if let Ok(doc) = ParameterBinder::new().bind(resolved.raw_content(), params) {
//!             println!("{} ({} bytes)", resolved.content_hash(), doc.len());
//!         }
//!     }
//! }
//! ```

pub mod binder;
pub mod context;
pub mod error;
pub mod hash;
pub mod source;
pub mod synth;

pub use binder::ParameterBinder;
pub use context::BindingContext;
pub use error::{FetchError, RenderError};
pub use hash::content_hash;
pub use source::{ResolvedTemplate, SourceResolver, TemplateSource};
pub use synth::ConfigurationSynthesizer;
