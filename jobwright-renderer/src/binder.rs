//! Tera binding engine: executes a job template against [`JobParameters`].
//!
//! # Template syntax
//!
//! Templates are Tera. The binding record exposes `Name`, `Description`,
//! `DisplayName`, `Disabled` and `Parameters`:
//!
//! ```text
//! <description>{{ Description }}</description>
//! <disabled>{{ Disabled }}</disabled>
//! {% if Parameters.branch %}<branch>{{ Parameters.branch }}</branch>{% endif %}
//! ```
//!
//! `${Name}` and `${Parameters.branch}` are accepted as shorthand for the
//! same expressions. Other `${...}` text (Groovy interpolation in pipeline
//! scripts, shell length expansions like `${#ITEMS[@]}`) is passed through
//! untouched, and so is any stray `{#`: Tera comments are not available.
//!
//! Every substituted value is XML-escaped; `{{ value | safe }}` opts out.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use tera::Tera;

use jobwright_core::JobParameters;

use crate::context::BindingContext;
use crate::error::RenderError;

/// Name the template is registered under; the `.xml` suffix turns on
/// autoescaping.
const TEMPLATE_NAME: &str = "config.xml";

// ---------------------------------------------------------------------------
// Shorthand placeholders
// ---------------------------------------------------------------------------

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^\$\{\s*(Name|Description|DisplayName|Disabled|Parameters)((?:\.[A-Za-z0-9_\-]+)*)\s*\}$",
        )
        .expect("placeholder pattern is valid")
    })
}

/// Any single-line `${...}`, or a `{#` that would open a Tera comment.
fn literal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{[^{}\n]*\}|\{#").expect("literal pattern is valid")
    })
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn placeholder_expr(caps: &Captures<'_>) -> String {
    let mut expr = caps[1].to_string();
    for segment in caps[2].split('.').filter(|s| !s.is_empty()) {
        if is_identifier(segment) {
            expr.push('.');
            expr.push_str(segment);
        } else {
            expr.push_str(&format!("[\"{segment}\"]"));
        }
    }
    format!("{{{{ {expr} }}}}")
}

/// Rewrite `${Root.path}` shorthand into Tera `{{ Root.path }}` expressions
/// and fence every other `${...}` and `{#` in a raw block.
///
/// Path segments that are not identifiers (e.g. `my-key`) become subscripts.
pub fn expand_placeholders(text: &str) -> Cow<'_, str> {
    literal_pattern().replace_all(text, |caps: &Captures<'_>| {
        let found = &caps[0];
        match placeholder_pattern().captures(found) {
            Some(placeholder) => placeholder_expr(&placeholder),
            None => format!("{{% raw %}}{found}{{% endraw %}}"),
        }
    })
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

fn escape_xml(input: &str) -> String {
    quick_xml::escape::escape(input).into_owned()
}

fn build_tera(template: &str) -> Result<Tera, RenderError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![".xml"]);
    tera.set_escape_fn(escape_xml);
    tera.add_raw_template(TEMPLATE_NAME, template)
        .map_err(RenderError::TemplateSyntax)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// ParameterBinder
// ---------------------------------------------------------------------------

/// Parses a template and executes it against job parameters.
///
/// Holds no state between calls; every call parses afresh.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterBinder;

impl ParameterBinder {
    pub fn new() -> Self {
        ParameterBinder
    }

    /// Bind raw template bytes. Bytes that are not UTF-8 are a syntax error.
    pub fn bind(&self, template: &[u8], params: &JobParameters) -> Result<String, RenderError> {
        let text = std::str::from_utf8(template).map_err(|e| {
            RenderError::TemplateSyntax(tera::Error::msg(format!(
                "template is not valid UTF-8: {e}"
            )))
        })?;
        self.bind_str(text, params)
    }

    pub fn bind_str(&self, template: &str, params: &JobParameters) -> Result<String, RenderError> {
        let expanded = expand_placeholders(template);
        let tera = build_tera(&expanded)?;
        let ctx = BindingContext::from_parameters(params).to_tera_context()?;
        let document = tera
            .render(TEMPLATE_NAME, &ctx)
            .map_err(RenderError::TemplateExecution)?;
        tracing::debug!("bound template for job {}", params.name);
        Ok(document)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
