//! Domain types shared by the renderer, the reconciler and the host.
//!
//! All types are serializable/deserializable via serde; manifests are YAML,
//! applied state is JSON.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::JobDefinitionModel;
use crate::reference::TemplateReference;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// The name of a job in the external registry. This is the job's identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobName(pub String);

impl JobName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for JobName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Job parameters
// ---------------------------------------------------------------------------

/// The fixed binding record a template is executed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobParameters {
    pub name: JobName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl JobParameters {
    pub fn new(name: impl Into<JobName>) -> Self {
        JobParameters {
            name: name.into(),
            description: None,
            display_name: None,
            disabled: false,
            parameters: BTreeMap::new(),
        }
    }

    /// True when everything except the job name is identical.
    pub fn same_bindings(&self, other: &JobParameters) -> bool {
        self.description == other.description
            && self.display_name == other.display_name
            && self.disabled == other.disabled
            && self.parameters == other.parameters
    }
}

// ---------------------------------------------------------------------------
// Reconciliation state
// ---------------------------------------------------------------------------

/// Last-applied state of one job; the only state that crosses reconciliations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobName,
    pub template_hash: String,
    /// Reference suffix the last push was made under, kept only when it
    /// disagreed with `template_hash`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_suffix: Option<String>,
}

impl JobRecord {
    pub fn new(id: impl Into<JobName>, template_hash: impl Into<String>) -> Self {
        JobRecord {
            id: id.into(),
            template_hash: template_hash.into(),
            acknowledged_suffix: None,
        }
    }
}

/// Where the job document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    /// A Tera template bound against [`JobParameters`].
    Template(TemplateReference),
    /// A typed model synthesized directly into a document.
    Definition(Box<JobDefinitionModel>),
}

/// Desired state of one job as handed to the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredJob {
    pub parameters: JobParameters,
    pub source: JobSource,
}

impl DesiredJob {
    pub fn name(&self) -> &JobName {
        &self.parameters.name
    }

    /// True when `previous` bindings differ from the desired ones in a way
    /// the document depends on. Definition jobs never read the bindings.
    pub fn rebinds(&self, previous: &JobParameters) -> bool {
        match self.source {
            JobSource::Template(_) => !self.parameters.same_bindings(previous),
            JobSource::Definition(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// A job manifest as stored under `~/.jobwright/jobs/<key>.yaml`.
///
/// Exactly one of `template` and `definition` must be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobManifest {
    pub name: JobName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<JobDefinitionModel>,
}

impl JobManifest {
    pub fn with_template(name: impl Into<JobName>, template: TemplateReference) -> Self {
        JobManifest {
            name: name.into(),
            description: None,
            display_name: None,
            disabled: false,
            parameters: BTreeMap::new(),
            template: Some(template),
            definition: None,
        }
    }

    pub fn with_definition(name: impl Into<JobName>, definition: JobDefinitionModel) -> Self {
        JobManifest {
            name: name.into(),
            description: None,
            display_name: None,
            disabled: false,
            parameters: BTreeMap::new(),
            template: None,
            definition: Some(definition),
        }
    }

    pub fn parameters(&self) -> JobParameters {
        JobParameters {
            name: self.name.clone(),
            description: self.description.clone(),
            display_name: self.display_name.clone(),
            disabled: self.disabled,
            parameters: self.parameters.clone(),
        }
    }

    /// Validate the manifest and turn it into reconciler input.
    pub fn desired(&self) -> Result<DesiredJob, ValidationError> {
        if self.name.0.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "name" });
        }
        let source = match (&self.template, &self.definition) {
            (Some(template), None) => JobSource::Template(template.clone()),
            (None, Some(definition)) => {
                self.reject_bindings()?;
                definition.validate()?;
                JobSource::Definition(Box::new(definition.clone()))
            }
            _ => return Err(ValidationError::AmbiguousSource),
        };
        Ok(DesiredJob {
            parameters: self.parameters(),
            source,
        })
    }

    fn reject_bindings(&self) -> Result<(), ValidationError> {
        let field = if self.description.is_some() {
            "description"
        } else if self.display_name.is_some() {
            "display_name"
        } else if self.disabled {
            "disabled"
        } else if !self.parameters.is_empty() {
            "parameters"
        } else {
            return Ok(());
        };
        Err(ValidationError::DefinitionBinding { field })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
