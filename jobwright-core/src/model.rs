//! Typed job definition model, synthesized into a pipeline `config.xml`.
//!
//! Every optional section is either absent or complete. Enumerated values
//! parse case-insensitively; anything else is a [`ValidationError`] raised
//! while the model is built, never later during synthesis.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Result threshold of an upstream build that triggers this job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Threshold {
    Success,
    Unstable,
    Failure,
}

impl Threshold {
    pub const ALLOWED: &'static [&'static str] = &["success", "unstable", "failure"];

    pub fn all() -> &'static [Threshold] {
        &[Threshold::Success, Threshold::Unstable, Threshold::Failure]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Threshold::Success => "success",
            Threshold::Unstable => "unstable",
            Threshold::Failure => "failure",
        }
    }
}

/// Time window of a build throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Period {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    pub const ALLOWED: &'static [&'static str] = &["hour", "day", "week", "month", "year"];

    pub fn all() -> &'static [Period] {
        &[Period::Hour, Period::Day, Period::Week, Period::Month, Period::Year]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Hour => "hour",
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }
}

macro_rules! closed_enum_conversions {
    ($ty:ident, $field:literal) => {
        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::all()
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| ValidationError::UnknownVariant {
                        field: $field,
                        value: s.to_string(),
                        allowed: $ty::ALLOWED,
                    })
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ValidationError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$ty> for String {
            fn from(v: $ty) -> Self {
                v.as_str().to_string()
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum_conversions!(Threshold, "triggers.upstream.threshold");
closed_enum_conversions!(Period, "throttle_builds.period");

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Log rotation settings; `0` keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildDiscardPolicy {
    #[serde(default)]
    pub days_to_keep_builds: u32,
    #[serde(default)]
    pub max_builds_to_keep: u32,
    #[serde(default)]
    pub days_to_keep_artifacts: u32,
    #[serde(default)]
    pub max_artifacts_to_keep: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GithubProject {
    pub project_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThrottleBuilds {
    #[serde(default = "default_rate")]
    pub rate: u32,
    pub period: Period,
}

fn default_rate() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamTrigger {
    /// Comma-separated list of upstream job names.
    pub projects: String,
    pub threshold: Threshold,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimerTrigger {
    /// Cron-like schedule.
    pub spec: String,
}

/// Build on GitHub push; presence enables it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GithubHookTrigger {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScmPollTrigger {
    pub schedule: String,
    #[serde(default)]
    pub ignore_post_commit_hooks: bool,
}

/// Independently present trigger variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Triggers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<UpstreamTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_hook: Option<GithubHookTrigger>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scm_poll: Option<ScmPollTrigger>,
}

impl Triggers {
    pub fn is_empty(&self) -> bool {
        self.upstream.is_none()
            && self.timer.is_none()
            && self.github_hook.is_none()
            && self.scm_poll.is_none()
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobDefinitionModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_discard_policy: Option<BuildDiscardPolicy>,
    #[serde(default)]
    pub disallow_concurrent_builds: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_project: Option<GithubProject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle_builds: Option<ThrottleBuilds>,
    #[serde(default, skip_serializing_if = "Triggers::is_empty")]
    pub triggers: Triggers,
    /// Seconds to wait before a triggered build starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiet_period: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_trigger_token: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

impl JobDefinitionModel {
    /// Parse and validate a model from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ValidationError> {
        let model: JobDefinitionModel =
            serde_yaml::from_str(yaml).map_err(|e| ValidationError::Schema(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    /// Check the constraints serde cannot express: required strings must be
    /// non-empty and the throttle rate must be positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(project) = &self.github_project {
            require("github_project.project_url", &project.project_url)?;
        }
        if let Some(throttle) = &self.throttle_builds {
            if throttle.rate == 0 {
                return Err(ValidationError::OutOfRange {
                    field: "throttle_builds.rate",
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        if let Some(upstream) = &self.triggers.upstream {
            require("triggers.upstream.projects", &upstream.projects)?;
        }
        if let Some(timer) = &self.triggers.timer {
            require("triggers.timer.spec", &timer.spec)?;
        }
        if let Some(poll) = &self.triggers.scm_poll {
            require("triggers.scm_poll.schedule", &poll.schedule)?;
        }
        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
