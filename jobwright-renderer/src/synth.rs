//! Pipeline `config.xml` synthesis from a [`JobDefinitionModel`].
//!
//! The document is produced as an ordered list of [`Section`]s and then
//! joined. Jenkins reads the file in order, so the section order below is
//! part of the output contract:
//!
//! | # | section                         | emitted                      |
//! |---|---------------------------------|------------------------------|
//! | 1 | preamble, `<actions/>`          | always                       |
//! | 2 | `description`                   | iff set                      |
//! | 3 | `displayName`                   | iff set                      |
//! | 4 | `keepDependencies`              | always, `false`              |
//! | 5 | `<properties>`                  | always                       |
//! |   | build discarder                 | iff set                      |
//! |   | concurrent-build marker         | iff `disallow_concurrent_builds` |
//! |   | GitHub project                  | iff set                      |
//! |   | throttle                        | iff set                      |
//! | 6 | triggers container              | iff any trigger is set       |
//! | 7 | `</properties>`, CPS definition | always, empty sandboxed script |
//! | 8 | `quietPeriod`, `authToken`      | iff set                      |
//! |   | `disabled`                      | always                       |
//! | 9 | closing tag                     | always                       |

use std::fmt::Display;

use jobwright_core::model::{
    BuildDiscardPolicy, GithubProject, ScmPollTrigger, ThrottleBuilds, TimerTrigger, Triggers,
    UpstreamTrigger,
};
use jobwright_core::{JobDefinitionModel, Threshold};

use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Preamble,
    Description,
    DisplayName,
    KeepDependencies,
    PropertiesOpen,
    BuildDiscarder,
    DisableConcurrentBuilds,
    GithubProject,
    ThrottleBuilds,
    Triggers,
    PropertiesClose,
    Definition,
    QuietPeriod,
    AuthToken,
    Disabled,
    Closing,
}

/// One contiguous block of the document, already indented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub lines: Vec<String>,
}

impl Section {
    fn new(kind: SectionKind, lines: Vec<String>) -> Self {
        Section { kind, lines }
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

fn pad(depth: usize) -> String {
    " ".repeat(depth)
}

fn raw(depth: usize, text: &str) -> String {
    format!("{}{text}", pad(depth))
}

/// `<tag>value</tag>` with the value XML-escaped.
fn leaf(depth: usize, tag: &str, value: impl Display) -> String {
    let value = value.to_string();
    format!("{}<{tag}>{}</{tag}>", pad(depth), quick_xml::escape::escape(value.as_str()))
}

// ---------------------------------------------------------------------------
// Threshold vocabulary
// ---------------------------------------------------------------------------

/// Jenkins `Result` tokens for an upstream threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdTokens {
    pub name: &'static str,
    pub ordinal: u8,
    pub color: &'static str,
}

/// Closed mapping from [`Threshold`] to Jenkins tokens.
pub fn threshold_tokens(threshold: Threshold) -> ThresholdTokens {
    match threshold {
        Threshold::Success => ThresholdTokens {
            name: "SUCCESS",
            ordinal: 0,
            color: "BLUE",
        },
        Threshold::Unstable => ThresholdTokens {
            name: "UNSTABLE",
            ordinal: 1,
            color: "YELLOW",
        },
        Threshold::Failure => ThresholdTokens {
            name: "FAILURE",
            ordinal: 2,
            color: "RED",
        },
    }
}

// ---------------------------------------------------------------------------
// Section builders
// ---------------------------------------------------------------------------

pub fn preamble() -> Section {
    Section::new(
        SectionKind::Preamble,
        vec![
            "<?xml version='1.0' encoding='UTF-8'?>".to_string(),
            "<flow-definition plugin=\"workflow-job@2.11\">".to_string(),
            raw(1, "<actions/>"),
        ],
    )
}

pub fn build_discarder(policy: &BuildDiscardPolicy) -> Section {
    Section::new(
        SectionKind::BuildDiscarder,
        vec![
            raw(2, "<jenkins.model.BuildDiscarderProperty>"),
            raw(3, "<strategy class=\"hudson.tasks.LogRotator\">"),
            leaf(4, "daysToKeep", policy.days_to_keep_builds),
            leaf(4, "numToKeep", policy.max_builds_to_keep),
            leaf(4, "artifactDaysToKeep", policy.days_to_keep_artifacts),
            leaf(4, "artifactNumToKeep", policy.max_artifacts_to_keep),
            raw(3, "</strategy>"),
            raw(2, "</jenkins.model.BuildDiscarderProperty>"),
        ],
    )
}

pub fn disable_concurrent_builds() -> Section {
    Section::new(
        SectionKind::DisableConcurrentBuilds,
        vec![raw(
            2,
            "<org.jenkinsci.plugins.workflow.job.properties.DisableConcurrentBuildsJobProperty/>",
        )],
    )
}

pub fn github_project(project: &GithubProject) -> Section {
    let mut lines = vec![
        raw(2, "<com.coravy.hudson.plugins.github.GithubProjectProperty plugin=\"github@1.27.0\">"),
        leaf(3, "projectUrl", &project.project_url),
    ];
    if let Some(name) = &project.display_name {
        lines.push(leaf(3, "displayName", name));
    }
    lines.push(raw(2, "</com.coravy.hudson.plugins.github.GithubProjectProperty>"));
    Section::new(SectionKind::GithubProject, lines)
}

pub fn throttle_builds(throttle: &ThrottleBuilds) -> Section {
    Section::new(
        SectionKind::ThrottleBuilds,
        vec![
            raw(
                2,
                "<jenkins.branch.RateLimitBranchProperty_-JobPropertyImpl plugin=\"branch-api@2.0.9\">",
            ),
            leaf(3, "durationName", throttle.period.as_str()),
            leaf(3, "count", throttle.rate),
            raw(2, "</jenkins.branch.RateLimitBranchProperty_-JobPropertyImpl>"),
        ],
    )
}

fn upstream_trigger(trigger: &UpstreamTrigger) -> Vec<String> {
    let tokens = threshold_tokens(trigger.threshold);
    vec![
        raw(4, "<jenkins.triggers.ReverseBuildTrigger>"),
        raw(5, "<spec></spec>"),
        leaf(5, "upstreamProjects", &trigger.projects),
        raw(5, "<threshold>"),
        leaf(6, "name", tokens.name),
        leaf(6, "ordinal", tokens.ordinal),
        leaf(6, "color", tokens.color),
        leaf(6, "completeBuild", true),
        raw(5, "</threshold>"),
        raw(4, "</jenkins.triggers.ReverseBuildTrigger>"),
    ]
}

fn timer_trigger(trigger: &TimerTrigger) -> Vec<String> {
    vec![
        raw(4, "<hudson.triggers.TimerTrigger>"),
        leaf(5, "spec", &trigger.spec),
        raw(4, "</hudson.triggers.TimerTrigger>"),
    ]
}

fn github_hook_trigger() -> Vec<String> {
    vec![
        raw(4, "<com.cloudbees.jenkins.GitHubPushTrigger plugin=\"github@1.27.0\">"),
        raw(5, "<spec></spec>"),
        raw(4, "</com.cloudbees.jenkins.GitHubPushTrigger>"),
    ]
}

fn scm_poll_trigger(trigger: &ScmPollTrigger) -> Vec<String> {
    vec![
        raw(4, "<hudson.triggers.SCMTrigger>"),
        leaf(5, "spec", &trigger.schedule),
        leaf(5, "ignorePostCommitHooks", trigger.ignore_post_commit_hooks),
        raw(4, "</hudson.triggers.SCMTrigger>"),
    ]
}

/// The single triggers container, or `None` when no trigger is set.
pub fn triggers(triggers: &Triggers) -> Option<Section> {
    if triggers.is_empty() {
        return None;
    }
    let mut lines = vec![
        raw(2, "<org.jenkinsci.plugins.workflow.job.properties.PipelineTriggersJobProperty>"),
        raw(3, "<triggers>"),
    ];
    if let Some(upstream) = &triggers.upstream {
        lines.extend(upstream_trigger(upstream));
    }
    if let Some(timer) = &triggers.timer {
        lines.extend(timer_trigger(timer));
    }
    if triggers.github_hook.is_some() {
        lines.extend(github_hook_trigger());
    }
    if let Some(poll) = &triggers.scm_poll {
        lines.extend(scm_poll_trigger(poll));
    }
    lines.push(raw(3, "</triggers>"));
    lines.push(raw(2, "</org.jenkinsci.plugins.workflow.job.properties.PipelineTriggersJobProperty>"));
    Some(Section::new(SectionKind::Triggers, lines))
}

pub fn definition() -> Section {
    Section::new(
        SectionKind::Definition,
        vec![
            raw(
                1,
                "<definition class=\"org.jenkinsci.plugins.workflow.cps.CpsFlowDefinition\" plugin=\"workflow-cps@2.32\">",
            ),
            raw(2, "<script></script>"),
            raw(2, "<sandbox>true</sandbox>"),
            raw(1, "</definition>"),
            raw(1, "<triggers/>"),
        ],
    )
}

/// All sections for `model`, in document order. Absent optional sections
/// contribute nothing.
pub fn sections(model: &JobDefinitionModel) -> Vec<Section> {
    let mut out = vec![preamble()];
    if let Some(description) = &model.description {
        out.push(Section::new(SectionKind::Description, vec![leaf(1, "description", description)]));
    }
    if let Some(name) = &model.display_name {
        out.push(Section::new(SectionKind::DisplayName, vec![leaf(1, "displayName", name)]));
    }
    out.push(Section::new(
        SectionKind::KeepDependencies,
        vec![leaf(1, "keepDependencies", false)],
    ));

    out.push(Section::new(SectionKind::PropertiesOpen, vec![raw(1, "<properties>")]));
    if let Some(policy) = &model.build_discard_policy {
        out.push(build_discarder(policy));
    }
    if model.disallow_concurrent_builds {
        out.push(disable_concurrent_builds());
    }
    if let Some(project) = &model.github_project {
        out.push(github_project(project));
    }
    if let Some(throttle) = &model.throttle_builds {
        out.push(throttle_builds(throttle));
    }
    out.extend(triggers(&model.triggers));
    out.push(Section::new(SectionKind::PropertiesClose, vec![raw(1, "</properties>")]));

    out.push(definition());
    if let Some(seconds) = model.quiet_period {
        out.push(Section::new(SectionKind::QuietPeriod, vec![leaf(1, "quietPeriod", seconds)]));
    }
    if let Some(token) = &model.remote_trigger_token {
        out.push(Section::new(SectionKind::AuthToken, vec![leaf(1, "authToken", token)]));
    }
    out.push(Section::new(SectionKind::Disabled, vec![leaf(1, "disabled", model.disabled)]));
    out.push(Section::new(SectionKind::Closing, vec!["</flow-definition>".to_string()]));
    out
}

// ---------------------------------------------------------------------------
// ConfigurationSynthesizer
// ---------------------------------------------------------------------------

/// Builds a pipeline `config.xml` straight from a typed model.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigurationSynthesizer;

impl ConfigurationSynthesizer {
    pub fn new() -> Self {
        ConfigurationSynthesizer
    }

    /// Validate `model`, then emit the document. Nothing is emitted when
    /// validation fails.
    pub fn synthesize(&self, model: &JobDefinitionModel) -> Result<String, RenderError> {
        model.validate()?;
        Ok(sections(model).iter().map(Section::text).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
