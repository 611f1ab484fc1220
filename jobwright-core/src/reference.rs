//! Template references.
//!
//! A reference is one of
//!
//! ```text
//! <inline text>
//! file://<path>
//! http://<url> | https://<url>
//! ```
//!
//! optionally followed by `@<32 lowercase hex>`, the content hash observed
//! the last time the reference was resolved. The suffix is split off before
//! the address is classified.

use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ReferenceError;

/// Length of a recorded hash suffix, in hex characters.
pub const HASH_SUFFIX_LEN: usize = 32;

fn suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)^(.*)@([a-f0-9]{32})$").expect("hash suffix pattern is valid")
    })
}

/// A parsed template reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TemplateReference {
    body: String,
    recorded_hash: Option<String>,
}

/// Where a reference points to, after the hash suffix is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateAddress {
    Inline(String),
    File(PathBuf),
    Url(Url),
}

impl TemplateReference {
    pub fn new(input: impl Into<String>) -> Self {
        let input = input.into();
        if let Some(caps) = suffix_pattern().captures(&input) {
            return TemplateReference {
                body: caps[1].to_string(),
                recorded_hash: Some(caps[2].to_string()),
            };
        }
        TemplateReference {
            body: input,
            recorded_hash: None,
        }
    }

    /// The reference without its hash suffix.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The hash embedded in the reference, if any.
    pub fn recorded_hash(&self) -> Option<&str> {
        self.recorded_hash.as_deref()
    }

    /// Classify the body into an address.
    pub fn address(&self) -> Result<TemplateAddress, ReferenceError> {
        let body = self.body.as_str();
        if body.starts_with("http://") || body.starts_with("https://") {
            let url = Url::parse(body).map_err(|e| ReferenceError::MalformedUrl {
                url: body.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(TemplateAddress::Url(url));
        }
        if let Some(path) = body.strip_prefix("file://") {
            if path.is_empty() {
                return Err(ReferenceError::EmptyPath {
                    reference: body.to_string(),
                });
            }
            return Ok(TemplateAddress::File(PathBuf::from(path)));
        }
        Ok(TemplateAddress::Inline(body.to_string()))
    }
}

impl fmt::Display for TemplateReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.recorded_hash {
            Some(hash) => write!(f, "{}@{}", self.body, hash),
            None => f.write_str(&self.body),
        }
    }
}

impl From<String> for TemplateReference {
    fn from(s: String) -> Self {
        TemplateReference::new(s)
    }
}

impl From<&str> for TemplateReference {
    fn from(s: &str) -> Self {
        TemplateReference::new(s)
    }
}

impl From<TemplateReference> for String {
    fn from(r: TemplateReference) -> Self {
        r.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "deadbeefdeadbeefdeadbeefdeadbeef";

    #[test]
    fn suffix_is_split_from_inline_body() {
        let r = TemplateReference::new(format!("abc@{HASH}"));
        assert_eq!(r.body(), "abc");
        assert_eq!(r.recorded_hash(), Some(HASH));
        assert_eq!(r.address().unwrap(), TemplateAddress::Inline("abc".into()));
    }

    #[test]
    fn uppercase_or_short_suffix_is_part_of_the_body() {
        let upper = TemplateReference::new("abc@DEADBEEFDEADBEEFDEADBEEFDEADBEEF");
        assert_eq!(upper.recorded_hash(), None);
        assert_eq!(upper.body(), "abc@DEADBEEFDEADBEEFDEADBEEFDEADBEEF");

        let short = TemplateReference::new("user@deadbeef");
        assert_eq!(short.recorded_hash(), None);
    }

    #[test]
    fn multiline_inline_template_keeps_suffix_detection() {
        let r = TemplateReference::new(format!("<a>\n</a>@{HASH}"));
        assert_eq!(r.body(), "<a>\n</a>");
        assert_eq!(r.recorded_hash(), Some(HASH));
    }

    #[test]
    fn file_scheme_is_stripped() {
        let r = TemplateReference::new(format!("file:///tmp/t.xml@{HASH}"));
        assert_eq!(
            r.address().unwrap(),
            TemplateAddress::File(PathBuf::from("/tmp/t.xml"))
        );
    }

    #[test]
    fn empty_file_path_is_an_address_error() {
        let err = TemplateReference::new("file://").address().unwrap_err();
        assert!(matches!(err, ReferenceError::EmptyPath { .. }));
    }

    #[test]
    fn malformed_url_is_an_address_error() {
        let err = TemplateReference::new("http://").address().unwrap_err();
        assert!(matches!(err, ReferenceError::MalformedUrl { .. }), "got: {err}");
    }

    #[test]
    fn display_restores_original_form() {
        let input = format!("https://example.com/t.xml@{HASH}");
        assert_eq!(TemplateReference::new(input.clone()).to_string(), input);
    }
}
