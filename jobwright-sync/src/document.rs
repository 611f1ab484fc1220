//! Desired state → fingerprint → document.
//!
//! Drift is decided on the fingerprint alone. For template jobs the
//! fingerprint is the hash of the raw template bytes, so binding only happens
//! once the reconciler knows the job needs writing. For definition jobs the
//! synthesized document itself is hashed.
//!
//! A reference suffix that disagrees with the content hash forces one push;
//! the record then carries the suffix as acknowledged and later runs settle.

use jobwright_core::{DesiredJob, JobName, JobRecord, JobSource};
use jobwright_renderer::{
    content_hash, ConfigurationSynthesizer, ParameterBinder, SourceResolver,
};

use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Body {
    Template(Vec<u8>),
    Document(String),
}

/// Content identity of a desired job, computed before any registry call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    hash: String,
    recorded_hash: Option<String>,
    body: Body,
}

impl Fingerprint {
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// The `@<hash>` suffix carried by the template reference, if any.
    pub fn recorded_hash(&self) -> Option<&str> {
        self.recorded_hash.as_deref()
    }

    /// True when nothing needs writing: the fresh hash equals the stored
    /// one, and the reference suffix (when present) either agrees with the
    /// fresh hash or was already acknowledged by a push.
    pub fn is_unchanged(&self, stored: &JobRecord) -> bool {
        self.hash == stored.template_hash
            && self.recorded_hash.as_deref().map_or(true, |recorded| {
                recorded == self.hash || stored.acknowledged_suffix.as_deref() == Some(recorded)
            })
    }

    /// The record to keep once a document built from this fingerprint has
    /// been pushed to the job `id`.
    pub fn record(&self, id: JobName) -> JobRecord {
        JobRecord {
            id,
            template_hash: self.hash.clone(),
            acknowledged_suffix: self
                .recorded_hash
                .clone()
                .filter(|recorded| *recorded != self.hash),
        }
    }
}

/// A bound document ready to hand to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub document: String,
    pub fingerprint: Fingerprint,
}

impl Rendered {
    pub fn template_hash(&self) -> &str {
        self.fingerprint.hash()
    }
}

/// Resolves, hashes and binds desired jobs.
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    resolver: SourceResolver,
    binder: ParameterBinder,
    synthesizer: ConfigurationSynthesizer,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        DocumentBuilder::default()
    }

    pub fn with_resolver(resolver: SourceResolver) -> Self {
        DocumentBuilder {
            resolver,
            ..DocumentBuilder::default()
        }
    }

    pub fn fingerprint(&self, desired: &DesiredJob) -> Result<Fingerprint, SyncError> {
        match &desired.source {
            JobSource::Template(reference) => {
                let resolved = self.resolver.resolve(reference)?;
                Ok(Fingerprint {
                    hash: resolved.content_hash().to_string(),
                    recorded_hash: resolved.recorded_hash().map(str::to_string),
                    body: Body::Template(resolved.raw_content().to_vec()),
                })
            }
            JobSource::Definition(model) => {
                let document = self.synthesizer.synthesize(model)?;
                Ok(Fingerprint {
                    hash: content_hash(document.as_bytes()),
                    recorded_hash: None,
                    body: Body::Document(document),
                })
            }
        }
    }

    /// Produce the document for a fingerprint taken from `desired`.
    pub fn bind(&self, desired: &DesiredJob, fingerprint: &Fingerprint) -> Result<Rendered, SyncError> {
        let document = match &fingerprint.body {
            Body::Template(raw) => self.binder.bind(raw, &desired.parameters)?,
            Body::Document(document) => document.clone(),
        };
        Ok(Rendered {
            document,
            fingerprint: fingerprint.clone(),
        })
    }

    /// Fingerprint and bind in one step.
    pub fn render(&self, desired: &DesiredJob) -> Result<Rendered, SyncError> {
        let fingerprint = self.fingerprint(desired)?;
        self.bind(desired, &fingerprint)
    }
}
